//! Seven-card hand evaluation.
//!
//! [`evaluate`] takes 5 to 7 distinct cards and returns the strongest
//! five-card hand they contain, as a category plus a lexicographic tiebreak
//! vector. Two hands with equal `(category, tiebreak)` tie exactly; there is
//! no random tie-breaking.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::cards::{Card, RankValue, Suit, RANK_ACE};
use super::errors::GameError;

/// Hand categories, strongest first. `strength()` gives the numeric code
/// (1 = Royal Flush .. 10 = High Card); lower is better.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HandCategory {
    RoyalFlush,
    StraightFlush,
    FourOfAKind,
    FullHouse,
    Flush,
    Straight,
    ThreeOfAKind,
    TwoPair,
    OnePair,
    HighCard,
}

impl HandCategory {
    pub fn strength(self) -> u8 {
        match self {
            Self::RoyalFlush => 1,
            Self::StraightFlush => 2,
            Self::FourOfAKind => 3,
            Self::FullHouse => 4,
            Self::Flush => 5,
            Self::Straight => 6,
            Self::ThreeOfAKind => 7,
            Self::TwoPair => 8,
            Self::OnePair => 9,
            Self::HighCard => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::RoyalFlush => "Royal Flush",
            Self::StraightFlush => "Straight Flush",
            Self::FourOfAKind => "Four of a Kind",
            Self::FullHouse => "Full House",
            Self::Flush => "Flush",
            Self::Straight => "Straight",
            Self::ThreeOfAKind => "Three of a Kind",
            Self::TwoPair => "Two Pair",
            Self::OnePair => "One Pair",
            Self::HighCard => "High Card",
        }
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The result of evaluating a set of cards.
///
/// Ordering: `a > b` means `a` is the stronger hand. Equality ignores
/// `best_five` — two hands that differ only in suits tie.
#[derive(Clone, Debug)]
pub struct HandScore {
    pub category: HandCategory,
    pub tiebreak: Vec<RankValue>,
    pub best_five: Vec<Card>,
}

impl HandScore {
    pub fn name(&self) -> &'static str {
        self.category.name()
    }
}

impl PartialEq for HandScore {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.tiebreak == other.tiebreak
    }
}

impl Eq for HandScore {}

impl Ord for HandScore {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower strength code is the better category.
        match other
            .category
            .strength()
            .cmp(&self.category.strength())
        {
            Ordering::Equal => self.tiebreak.cmp(&other.tiebreak),
            ord => ord,
        }
    }
}

impl PartialOrd for HandScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Evaluate 5..=7 distinct cards into their best five-card hand.
pub fn evaluate(cards: &[Card]) -> Result<HandScore, GameError> {
    if cards.len() < 5 {
        return Err(GameError::InsufficientCards);
    }
    let mut sorted: Vec<Card> = cards.to_vec();
    sorted.sort_by(|a, b| b.rank.cmp(&a.rank));

    if let Some(score) = check_straight_flush(&sorted) {
        return Ok(score);
    }
    if let Some(score) = check_four_of_a_kind(&sorted) {
        return Ok(score);
    }
    if let Some(score) = check_full_house(&sorted) {
        return Ok(score);
    }
    if let Some(score) = check_flush(&sorted) {
        return Ok(score);
    }
    if let Some(score) = check_straight(&sorted) {
        return Ok(score);
    }
    if let Some(score) = check_multiples(&sorted) {
        return Ok(score);
    }
    Ok(high_card(&sorted))
}

/// Ranks grouped by multiplicity, highest rank first within each count.
fn rank_groups(cards: &[Card]) -> Vec<(RankValue, Vec<Card>)> {
    let mut by_rank: BTreeMap<RankValue, Vec<Card>> = BTreeMap::new();
    for card in cards {
        by_rank.entry(card.rank).or_default().push(*card);
    }
    by_rank.into_iter().rev().collect()
}

fn suit_groups(cards: &[Card]) -> Vec<(Suit, Vec<Card>)> {
    Suit::ALL
        .iter()
        .map(|&suit| {
            (
                suit,
                cards.iter().copied().filter(|c| c.suit == suit).collect(),
            )
        })
        .collect()
}

/// Find a five-card run in rank-descending `cards` (duplicates allowed).
/// The wheel A-2-3-4-5 counts with top rank 5.
fn find_straight(cards: &[Card]) -> Option<Vec<Card>> {
    // One card per rank, highest first.
    let mut unique: Vec<Card> = Vec::new();
    for card in cards {
        if unique.last().map(|c| c.rank) != Some(card.rank) {
            unique.push(*card);
        }
    }
    for window in unique.windows(5) {
        if window[0].rank - window[4].rank == 4 {
            return Some(window.to_vec());
        }
    }
    // Wheel: ace plays low under 5-4-3-2.
    let ace = unique.iter().find(|c| c.rank == RANK_ACE)?;
    let mut wheel = Vec::with_capacity(5);
    for rank in [5, 4, 3, 2] {
        wheel.push(*unique.iter().find(|c| c.rank == rank)?);
    }
    wheel.push(*ace);
    Some(wheel)
}

fn check_straight_flush(cards: &[Card]) -> Option<HandScore> {
    for (_, suited) in suit_groups(cards) {
        if suited.len() < 5 {
            continue;
        }
        if let Some(run) = find_straight(&suited) {
            let top = run[0].rank;
            let category = if top == RANK_ACE {
                HandCategory::RoyalFlush
            } else {
                HandCategory::StraightFlush
            };
            return Some(HandScore {
                category,
                tiebreak: vec![top],
                best_five: run,
            });
        }
    }
    None
}

fn check_four_of_a_kind(cards: &[Card]) -> Option<HandScore> {
    let groups = rank_groups(cards);
    let (quad_rank, quad) = groups.iter().find(|(_, g)| g.len() == 4)?;
    let kicker = cards.iter().copied().find(|c| c.rank != *quad_rank);
    let mut best_five = quad.clone();
    let mut tiebreak = vec![*quad_rank];
    if let Some(kicker) = kicker {
        best_five.push(kicker);
        tiebreak.push(kicker.rank);
    }
    Some(HandScore {
        category: HandCategory::FourOfAKind,
        tiebreak,
        best_five,
    })
}

fn check_full_house(cards: &[Card]) -> Option<HandScore> {
    let groups = rank_groups(cards);
    let (trip_rank, trips) = groups.iter().find(|(_, g)| g.len() >= 3)?;
    let (pair_rank, pair) = groups
        .iter()
        .find(|(rank, g)| rank != trip_rank && g.len() >= 2)?;
    let mut best_five: Vec<Card> = trips[..3].to_vec();
    best_five.extend_from_slice(&pair[..2]);
    Some(HandScore {
        category: HandCategory::FullHouse,
        tiebreak: vec![*trip_rank, *pair_rank],
        best_five,
    })
}

fn check_flush(cards: &[Card]) -> Option<HandScore> {
    for (_, suited) in suit_groups(cards) {
        if suited.len() >= 5 {
            let best_five: Vec<Card> = suited[..5].to_vec();
            let tiebreak = best_five.iter().map(|c| c.rank).collect();
            return Some(HandScore {
                category: HandCategory::Flush,
                tiebreak,
                best_five,
            });
        }
    }
    None
}

fn check_straight(cards: &[Card]) -> Option<HandScore> {
    let run = find_straight(cards)?;
    Some(HandScore {
        category: HandCategory::Straight,
        tiebreak: vec![run[0].rank],
        best_five: run,
    })
}

/// Trips, two pair, and one pair share the same group/kicker bookkeeping.
fn check_multiples(cards: &[Card]) -> Option<HandScore> {
    let groups = rank_groups(cards);

    if let Some((trip_rank, trips)) = groups.iter().find(|(_, g)| g.len() == 3) {
        let kickers: Vec<Card> = cards
            .iter()
            .copied()
            .filter(|c| c.rank != *trip_rank)
            .take(2)
            .collect();
        let mut tiebreak = vec![*trip_rank];
        tiebreak.extend(kickers.iter().map(|c| c.rank));
        let mut best_five = trips.clone();
        best_five.extend_from_slice(&kickers);
        return Some(HandScore {
            category: HandCategory::ThreeOfAKind,
            tiebreak,
            best_five,
        });
    }

    let pairs: Vec<&(RankValue, Vec<Card>)> =
        groups.iter().filter(|(_, g)| g.len() == 2).collect();
    match pairs.as_slice() {
        [] => None,
        [only] => {
            let (pair_rank, pair) = only;
            let kickers: Vec<Card> = cards
                .iter()
                .copied()
                .filter(|c| c.rank != *pair_rank)
                .take(3)
                .collect();
            let mut tiebreak = vec![*pair_rank];
            tiebreak.extend(kickers.iter().map(|c| c.rank));
            let mut best_five = pair.clone();
            best_five.extend_from_slice(&kickers);
            Some(HandScore {
                category: HandCategory::OnePair,
                tiebreak,
                best_five,
            })
        }
        [high, second, ..] => {
            let (high_rank, high_pair) = high;
            let (second_rank, second_pair) = second;
            let kicker = cards
                .iter()
                .copied()
                .find(|c| c.rank != *high_rank && c.rank != *second_rank);
            let mut best_five: Vec<Card> = high_pair.clone();
            best_five.extend_from_slice(second_pair);
            let mut tiebreak = vec![*high_rank, *second_rank];
            if let Some(kicker) = kicker {
                best_five.push(kicker);
                tiebreak.push(kicker.rank);
            }
            Some(HandScore {
                category: HandCategory::TwoPair,
                tiebreak,
                best_five,
            })
        }
    }
}

fn high_card(cards: &[Card]) -> HandScore {
    let best_five: Vec<Card> = cards[..5].to_vec();
    let tiebreak = best_five.iter().map(|c| c.rank).collect();
    HandScore {
        category: HandCategory::HighCard,
        tiebreak,
        best_five,
    }
}
