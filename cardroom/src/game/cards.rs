//! The 52-card domain: cards, ranks, suits, and the deck.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::errors::GameError;

/// Numeric rank, 2..=14 with 14 = Ace.
pub type RankValue = u8;

pub const RANK_MIN: RankValue = 2;
pub const RANK_ACE: RankValue = 14;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];

    pub fn letter(self) -> char {
        match self {
            Suit::Spade => 'S',
            Suit::Heart => 'H',
            Suit::Diamond => 'D',
            Suit::Club => 'C',
        }
    }

    pub fn from_letter(c: char) -> Option<Suit> {
        match c.to_ascii_uppercase() {
            'S' => Some(Suit::Spade),
            'H' => Some(Suit::Heart),
            'D' => Some(Suit::Diamond),
            'C' => Some(Suit::Club),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A playing card. The wire form is the rank (`2`..`10`, `J`, `Q`, `K`, `A`)
/// followed by the suit letter; `10` is the only two-character rank, so
/// parsers read the suit off the last character.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card {
    pub rank: RankValue,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: RankValue, suit: Suit) -> Self {
        debug_assert!((RANK_MIN..=RANK_ACE).contains(&rank));
        Self { rank, suit }
    }

    pub fn rank_str(&self) -> &'static str {
        match self.rank {
            2 => "2",
            3 => "3",
            4 => "4",
            5 => "5",
            6 => "6",
            7 => "7",
            8 => "8",
            9 => "9",
            10 => "10",
            11 => "J",
            12 => "Q",
            13 => "K",
            14 => "A",
            _ => "?",
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank_str(), self.suit)
    }
}

impl FromStr for Card {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || GameError::Internal(format!("invalid card encoding: {s:?}"));
        let suit_char = s.chars().last().ok_or_else(bad)?;
        let suit = Suit::from_letter(suit_char).ok_or_else(bad)?;
        let rank = match &s[..s.len() - suit_char.len_utf8()] {
            "2" => 2,
            "3" => 3,
            "4" => 4,
            "5" => 5,
            "6" => 6,
            "7" => 7,
            "8" => 8,
            "9" => 9,
            "10" => 10,
            "J" => 11,
            "Q" => 12,
            "K" => 13,
            "A" => 14,
            _ => return Err(bad()),
        };
        Ok(Card::new(rank, suit))
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// An ordered 52-card deck dealt from the front. The shuffled order is kept
/// for the whole hand so dealt and undealt cards always partition one deck.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    next: usize,
}

impl Deck {
    /// A fresh deck in canonical order.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(52);
        for rank in RANK_MIN..=RANK_ACE {
            for suit in Suit::ALL {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards, next: 0 }
    }

    /// A fresh deck in uniformly random order.
    pub fn shuffled(rng: &mut impl Rng) -> Self {
        let mut deck = Self::standard();
        deck.shuffle(rng);
        deck
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.cards.shuffle(rng);
        self.next = 0;
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.next
    }

    /// Deal the top `n` cards in order.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, GameError> {
        if n > self.remaining() {
            return Err(GameError::DeckExhausted {
                requested: n,
                remaining: self.remaining(),
            });
        }
        let dealt = self.cards[self.next..self.next + n].to_vec();
        self.next += n;
        Ok(dealt)
    }

    pub fn deal_one(&mut self) -> Result<Card, GameError> {
        Ok(self.deal(1)?[0])
    }

    /// Drop a known card from the undealt portion. Only needed when
    /// reconstructing a deck around cards that are already out.
    pub fn remove(&mut self, card: Card) {
        if let Some(pos) = self.cards[self.next..].iter().position(|c| *c == card) {
            self.cards.remove(self.next + pos);
        }
    }

    /// Cards not yet dealt, in order.
    pub fn undealt(&self) -> &[Card] {
        &self.cards[self.next..]
    }
}
