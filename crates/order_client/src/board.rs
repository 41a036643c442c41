//! Typed board view-model: the columns and the cards in them. The rendered
//! board is a projection of this state.

use std::{cmp::Ordering, collections::HashMap};

use shared::domain::{Card, OrderId, Status};

use crate::error::ClientError;

/// Where a card sat before a move, used to put it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPlacement {
    pub status: Status,
    /// Index in the column at the time of the move.
    pub position: usize,
    rank: u64,
}

/// Every column is kept in ascending `ranks` order. A card keeps its rank for
/// as long as it stays in a column, so a reverted card slots back between the
/// same neighbours even when other cards left the column meanwhile.
#[derive(Debug, Clone, Default)]
pub struct Board {
    columns: [Vec<OrderId>; 4],
    cards: HashMap<OrderId, Card>,
    ranks: HashMap<OrderId, u64>,
    next_rank: u64,
}

impl Board {
    /// Cards keep their input order inside each column. A repeated order id
    /// replaces the earlier card.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut board = Self::default();
        for card in cards {
            board.insert(card);
        }
        board
    }

    pub fn insert(&mut self, card: Card) {
        if self.cards.contains_key(&card.order_id) {
            self.remove(&card.order_id);
        }
        self.append(&card.order_id, card.status);
        self.cards.insert(card.order_id.clone(), card);
    }

    pub fn remove(&mut self, order_id: &OrderId) -> Option<Card> {
        let card = self.cards.remove(order_id)?;
        self.columns[card.status.column_index()].retain(|id| id != order_id);
        self.ranks.remove(order_id);
        Some(card)
    }

    fn append(&mut self, order_id: &OrderId, status: Status) {
        self.ranks.insert(order_id.clone(), self.next_rank);
        self.next_rank += 1;
        self.columns[status.column_index()].push(order_id.clone());
    }

    fn rank_of(&self, order_id: &OrderId) -> u64 {
        self.ranks.get(order_id).copied().unwrap_or(u64::MAX)
    }

    pub fn card(&self, order_id: &OrderId) -> Option<&Card> {
        self.cards.get(order_id)
    }

    pub fn column(&self, status: Status) -> impl Iterator<Item = &Card> {
        self.columns[status.column_index()]
            .iter()
            .filter_map(|id| self.cards.get(id))
    }

    pub fn column_ids(&self, status: Status) -> &[OrderId] {
        &self.columns[status.column_index()]
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn placement(&self, order_id: &OrderId) -> Option<CardPlacement> {
        let card = self.cards.get(order_id)?;
        let position = self.columns[card.status.column_index()]
            .iter()
            .position(|id| id == order_id)?;
        Some(CardPlacement {
            status: card.status,
            position,
            rank: self.rank_of(order_id),
        })
    }

    /// Appends the card to the `target` column and returns where it was.
    pub fn move_card(
        &mut self,
        order_id: &OrderId,
        target: Status,
    ) -> Result<CardPlacement, ClientError> {
        let previous = self
            .placement(order_id)
            .ok_or_else(|| ClientError::UnknownCard(order_id.clone()))?;
        self.columns[previous.status.column_index()].remove(previous.position);
        self.append(order_id, target);
        if let Some(card) = self.cards.get_mut(order_id) {
            card.status = target;
        }
        Ok(previous)
    }

    /// Puts a card back at `placement`, provided it still sits in `expected`.
    /// The card lands between the neighbours it had when it was moved,
    /// regardless of the order in which pending moves are undone. Returns
    /// false when the board has drifted and a local revert would guess.
    pub fn restore_card(
        &mut self,
        order_id: &OrderId,
        expected: Status,
        placement: &CardPlacement,
    ) -> bool {
        match self.cards.get(order_id) {
            Some(card) if card.status == expected => {}
            _ => return false,
        }
        let column = &mut self.columns[expected.column_index()];
        let Some(index) = column.iter().position(|id| id == order_id) else {
            return false;
        };
        column.remove(index);

        let target = &self.columns[placement.status.column_index()];
        let position = target.partition_point(|id| self.rank_of(id) < placement.rank);
        self.columns[placement.status.column_index()].insert(position, order_id.clone());
        self.ranks.insert(order_id.clone(), placement.rank);
        if let Some(card) = self.cards.get_mut(order_id) {
            card.status = placement.status;
        }
        true
    }

    /// Reorders every column by card amount, highest first. Cards whose amount
    /// does not parse sink to the bottom in their current order.
    pub fn sort_by_amount(&mut self) {
        for status in Status::ALL {
            let index = status.column_index();
            let mut slots: Vec<u64> = self.columns[index]
                .iter()
                .map(|id| self.rank_of(id))
                .collect();
            slots.sort_unstable();

            let mut ordered = std::mem::take(&mut self.columns[index]);
            ordered.sort_by(|a, b| {
                let a = self.cards.get(a).and_then(Card::amount_value);
                let b = self.cards.get(b).and_then(Card::amount_value);
                match (a, b) {
                    (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            });
            for (id, rank) in ordered.iter().zip(slots) {
                self.ranks.insert(id.clone(), rank);
            }
            self.columns[index] = ordered;
        }
    }

    /// Cards whose id or display data contain `query`, case-insensitively, in
    /// board order. An empty query matches every card.
    pub fn search(&self, query: &str) -> Vec<&Card> {
        let needle = query.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .flat_map(|status| self.column(status))
            .filter(|card| needle.is_empty() || card.search_text().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
