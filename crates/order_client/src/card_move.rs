//! Drag-and-drop of order cards between workflow columns, plus the other
//! board actions (delete, amount sort).
//!
//! A drop moves the card on the local board first, then sends one
//! `/move_order` request. A rejection or transport failure rolls the move back
//! according to [`RollbackStrategy`]. Deletes are not optimistic: the card
//! leaves the board only once the server confirms.

use std::{collections::HashSet, sync::Arc};

use shared::{
    domain::{OrderId, Status},
    error::ActionError,
    protocol::{DeleteOrderRequest, MoveOrderRequest},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    board::{Board, CardPlacement},
    config::{RollbackStrategy, Settings},
    error::ClientError,
    ClientEvent, NoticeLevel, OrderApi,
};

pub const MOVE_CONFIRMED_NOTICE: &str = "Order moved successfully!";
pub const MOVE_REJECTED_FALLBACK: &str = "Failed to move order";
pub const MOVE_TRANSPORT_NOTICE: &str = "Error moving order";
pub const DELETE_CONFIRMED_NOTICE: &str = "Order deleted successfully";
pub const DELETE_REJECTED_FALLBACK: &str = "Failed to delete order";
pub const DELETE_TRANSPORT_NOTICE: &str = "Error deleting order";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging {
        card: OrderId,
        over: Option<Status>,
    },
    Committing {
        card: OrderId,
        from: Status,
        to: Status,
    },
}

/// How a failed move was undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    Reverted,
    ReloadRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Drop without an active drag.
    Ignored,
    /// Dropped back onto its own column; nothing sent.
    Unchanged,
    Confirmed {
        order_id: OrderId,
        from: Status,
        to: Status,
    },
    Rejected {
        order_id: OrderId,
        message: String,
        rollback: Rollback,
    },
    Failed {
        order_id: OrderId,
        rollback: Rollback,
    },
}

struct BoardState {
    board: Board,
    phase: DragPhase,
    in_flight: HashSet<OrderId>,
}

pub struct CardMoveController {
    api: Arc<dyn OrderApi>,
    settings: Settings,
    inner: Mutex<BoardState>,
    events: broadcast::Sender<ClientEvent>,
}

impl CardMoveController {
    pub fn new(api: Arc<dyn OrderApi>, settings: Settings, board: Board) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            settings,
            inner: Mutex::new(BoardState {
                board,
                phase: DragPhase::Idle,
                in_flight: HashSet::new(),
            }),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    pub async fn board(&self) -> Board {
        self.inner.lock().await.board.clone()
    }

    /// Swaps in a board refetched from the server, e.g. after a reload
    /// request. Any gesture in progress is dropped.
    pub async fn replace_board(&self, board: Board) {
        let mut guard = self.inner.lock().await;
        guard.board = board;
        if matches!(guard.phase, DragPhase::Dragging { .. }) {
            guard.phase = DragPhase::Idle;
        }
    }

    pub async fn phase(&self) -> DragPhase {
        self.inner.lock().await.phase.clone()
    }

    pub async fn is_in_flight(&self, order_id: &OrderId) -> bool {
        self.inner.lock().await.in_flight.contains(order_id)
    }

    /// Reorders the local board by amount, highest first.
    pub async fn sort_by_amount(&self) {
        self.inner.lock().await.board.sort_by_amount();
    }

    /// Deletes an order. The card stays on the board until the server
    /// confirms; it cannot be dragged while the request is pending.
    pub async fn delete(&self, order_id: &OrderId) -> Result<(), ClientError> {
        {
            let mut guard = self.inner.lock().await;
            if guard.board.card(order_id).is_none() {
                return Err(ClientError::UnknownCard(order_id.clone()));
            }
            if !guard.in_flight.insert(order_id.clone()) {
                return Err(ClientError::MoveInFlight(order_id.clone()));
            }
            if matches!(&guard.phase, DragPhase::Dragging { card, .. } if card == order_id) {
                guard.phase = DragPhase::Idle;
            }
        }

        let request = DeleteOrderRequest {
            order_id: order_id.clone(),
        };
        let result = self.api.delete_order(&request).await;

        let mut guard = self.inner.lock().await;
        guard.in_flight.remove(order_id);
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(%order_id, error = %err, "order delete failed");
                self.emit(ClientEvent::notice(
                    NoticeLevel::Error,
                    DELETE_TRANSPORT_NOTICE,
                ));
                return Err(ClientError::Transport(err));
            }
        };
        if let Some(rejection) = ActionError::from_response(&response, DELETE_REJECTED_FALLBACK) {
            warn!(%order_id, message = %rejection.message, "order delete rejected");
            self.emit(ClientEvent::notice(
                NoticeLevel::Error,
                rejection.message.clone(),
            ));
            return Err(rejection.into());
        }

        guard.board.remove(order_id);
        info!(%order_id, "order deleted");
        self.emit(ClientEvent::CardRemoved {
            order_id: order_id.clone(),
        });
        self.emit(ClientEvent::notice(
            NoticeLevel::Success,
            DELETE_CONFIRMED_NOTICE,
        ));
        Ok(())
    }

    pub async fn drag_start(&self, order_id: &OrderId) -> Result<(), ClientError> {
        let mut guard = self.inner.lock().await;
        if guard.board.card(order_id).is_none() {
            return Err(ClientError::UnknownCard(order_id.clone()));
        }
        if guard.in_flight.contains(order_id) {
            return Err(ClientError::MoveInFlight(order_id.clone()));
        }
        guard.phase = DragPhase::Dragging {
            card: order_id.clone(),
            over: None,
        };
        Ok(())
    }

    /// Highlights `target` as the prospective drop column.
    pub async fn drag_enter(&self, target: Status) -> Result<(), ClientError> {
        let mut guard = self.inner.lock().await;
        match &mut guard.phase {
            DragPhase::Dragging { over, .. } => {
                *over = Some(target);
                Ok(())
            }
            _ => Err(ClientError::NoActiveDrag),
        }
    }

    pub async fn drag_over(&self, target: Status) -> Result<(), ClientError> {
        self.drag_enter(target).await
    }

    pub async fn drag_leave(&self) {
        if let DragPhase::Dragging { over, .. } = &mut self.inner.lock().await.phase {
            *over = None;
        }
    }

    /// Gesture ended. Returns true when it was aborted without a drop.
    pub async fn drag_end(&self) -> bool {
        let mut guard = self.inner.lock().await;
        if matches!(guard.phase, DragPhase::Dragging { .. }) {
            guard.phase = DragPhase::Idle;
            return true;
        }
        false
    }

    pub async fn drop_on(&self, target: Status) -> Result<MoveOutcome, ClientError> {
        let (order_id, from, previous) = {
            let mut guard = self.inner.lock().await;
            let DragPhase::Dragging { card, .. } = &guard.phase else {
                return Ok(MoveOutcome::Ignored);
            };
            let order_id = card.clone();
            guard.phase = DragPhase::Idle;

            let from = guard
                .board
                .card(&order_id)
                .map(|card| card.status)
                .ok_or_else(|| ClientError::UnknownCard(order_id.clone()))?;
            if from == target {
                return Ok(MoveOutcome::Unchanged);
            }

            let previous = guard.board.move_card(&order_id, target)?;
            guard.in_flight.insert(order_id.clone());
            guard.phase = DragPhase::Committing {
                card: order_id.clone(),
                from,
                to: target,
            };
            (order_id, from, previous)
        };
        self.emit(ClientEvent::CardMoved {
            order_id: order_id.clone(),
            from,
            to: target,
        });

        let request = MoveOrderRequest {
            order_id: order_id.clone(),
            new_status: target,
            status_key: self.settings.move_status_key,
        };
        debug!(%order_id, %from, to = %target, "sending card move");
        let result = self.api.move_order(&request).await;

        let mut guard = self.inner.lock().await;
        guard.in_flight.remove(&order_id);
        if matches!(&guard.phase, DragPhase::Committing { card, .. } if *card == order_id) {
            guard.phase = DragPhase::Idle;
        }

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(%order_id, error = %err, "card move failed");
                self.emit(ClientEvent::notice(
                    NoticeLevel::Error,
                    MOVE_TRANSPORT_NOTICE,
                ));
                let rollback = self.roll_back(&mut guard, &order_id, target, &previous);
                return Ok(MoveOutcome::Failed { order_id, rollback });
            }
        };

        match ActionError::from_response(&response, MOVE_REJECTED_FALLBACK) {
            None => {
                info!(%order_id, %from, to = %target, "card move confirmed");
                self.emit(ClientEvent::notice(
                    NoticeLevel::Success,
                    MOVE_CONFIRMED_NOTICE,
                ));
                Ok(MoveOutcome::Confirmed {
                    order_id,
                    from,
                    to: target,
                })
            }
            Some(rejection) => {
                warn!(%order_id, message = %rejection.message, "card move rejected");
                self.emit(ClientEvent::notice(
                    NoticeLevel::Error,
                    rejection.message.clone(),
                ));
                let rollback = self.roll_back(&mut guard, &order_id, target, &previous);
                Ok(MoveOutcome::Rejected {
                    order_id,
                    message: rejection.message,
                    rollback,
                })
            }
        }
    }

    fn roll_back(
        &self,
        state: &mut BoardState,
        order_id: &OrderId,
        moved_to: Status,
        previous: &CardPlacement,
    ) -> Rollback {
        if self.settings.rollback == RollbackStrategy::Revert
            && state.board.restore_card(order_id, moved_to, previous)
        {
            self.emit(ClientEvent::CardReverted {
                order_id: order_id.clone(),
                to: previous.status,
            });
            return Rollback::Reverted;
        }

        if self.settings.rollback == RollbackStrategy::Revert {
            error!(%order_id, "board drifted during move; requesting reload");
        }
        self.emit(ClientEvent::ReloadRequested);
        Rollback::ReloadRequested
    }
}

#[cfg(test)]
#[path = "tests/card_move_tests.rs"]
mod tests;
