//! Optimistic state cell: speculative UI value with an explicit rollback path.
//!
//! A cell is either `Stable(v)` or `Speculative { previous, desired }`. Only one
//! mutation may be in flight; a second `begin` while speculative is rejected.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState<T> {
    Stable(T),
    Speculative { previous: T, desired: T },
}

/// Returned when a mutation is already awaiting the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimisticCell<T> {
    state: CellState<T>,
}

impl<T: Copy + PartialEq> OptimisticCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            state: CellState::Stable(value),
        }
    }

    pub fn state(&self) -> CellState<T> {
        self.state
    }

    /// Value the view should display right now.
    pub fn displayed(&self) -> T {
        match self.state {
            CellState::Stable(value) => value,
            CellState::Speculative { desired, .. } => desired,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, CellState::Speculative { .. })
    }

    /// Applies `desired` speculatively. Rejected while another mutation is pending.
    pub fn begin(&mut self, desired: T) -> Result<T, InFlight> {
        match self.state {
            CellState::Stable(previous) => {
                self.state = CellState::Speculative { previous, desired };
                Ok(desired)
            }
            CellState::Speculative { .. } => Err(InFlight),
        }
    }

    /// Settles with the server's authoritative value, which may differ from the guess.
    pub fn confirm(&mut self, server_value: T) -> T {
        self.state = CellState::Stable(server_value);
        server_value
    }

    /// Settles after a failed mutation, restoring the pre-mutation value.
    ///
    /// A rollback on a stable cell leaves it untouched.
    pub fn rollback(&mut self) -> T {
        if let CellState::Speculative { previous, .. } = self.state {
            self.state = CellState::Stable(previous);
        }
        self.displayed()
    }
}

impl OptimisticCell<bool> {
    /// Flips the displayed value speculatively.
    pub fn toggle(&mut self) -> Result<bool, InFlight> {
        let next = !self.displayed();
        self.begin(next)
    }
}

impl<T: Copy + PartialEq + Default> Default for OptimisticCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
