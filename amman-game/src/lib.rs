//! Amman Hotel Game Engine
//!
//! Platform-agnostic progress, unlock and event tracking for the Amman Hotel
//! mystery. This crate owns the game state and its rules; rendering is left to
//! whatever implements [`NotificationSink`] and drives [`HotelSession`].

pub mod clock;
pub mod config;
pub mod constants;
pub mod data;
pub mod events;
pub mod night_elk;
pub mod notify;
pub mod procedures;
pub mod progress;
pub mod requirements;
pub mod session;
pub mod state;
pub mod unlock;

// Re-export commonly used types
pub use clock::{HourWindow, SimClock, SimTime};
pub use config::{HotelConfig, HotelConfigError, NightElkConfig, UnlockMode};
pub use data::{DataError, HotelData, HotelLayout, PlayerProfile};
pub use events::{DeferredEvent, DeferredKind, EventHandle, EventQueue};
pub use notify::{
    Notification, NotificationId, NotificationKind, NotificationSink, Notifier, NullSink,
};
pub use procedures::{Procedure, ProcedureCatalog, ProcedureEffect, ProcedureStatus, RevealStep};
pub use progress::{
    AnomalyBand, AnomalyChange, PhaseThresholds, PhaseTransition, ProgressReport, ProgressState,
    PuzzlePhase,
};
pub use requirements::{Requirement, RequirementCheck, RequirementParseError};
pub use session::{ActionError, HotelSession};
pub use state::{
    Area, AvatarTier, GameState, HotelState, InventoryItem, PlayerState, RuleViolation, WaterRule,
};
pub use unlock::UnlockEvaluator;

use std::convert::Infallible;
use thiserror::Error;

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load hotel content from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the hotel content cannot be loaded.
    fn load_hotel_data(&self) -> Result<HotelData, Self::Error>;

    /// Load session configuration. Defaults apply unless overridden.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_hotel_config(&self) -> Result<HotelConfig, Self::Error> {
        Ok(HotelConfig::default())
    }
}

/// Loader backed by the content bundled with this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLoader;

impl DataLoader for StaticLoader {
    type Error = Infallible;

    fn load_hotel_data(&self) -> Result<HotelData, Self::Error> {
        Ok(HotelData::default_data().clone())
    }
}

#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to load hotel content: {0}")]
    Load(#[source] E),
    #[error(transparent)]
    Config(#[from] HotelConfigError),
}

/// Main game engine for creating hotel stays
pub struct HotelEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> HotelEngine<L>
where
    L: DataLoader,
{
    /// Create a new engine with the provided data loader
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Start a headless stay with the specified seed
    ///
    /// # Errors
    ///
    /// Returns an error if content or config cannot be loaded, or the config
    /// fails validation.
    pub fn create_session(&self, seed: u64) -> Result<HotelSession, EngineError<L::Error>> {
        self.create_session_with_sink(seed, Box::new(NullSink))
    }

    /// Start a stay whose notifications are reported to `sink`
    ///
    /// # Errors
    ///
    /// Returns an error if content or config cannot be loaded, or the config
    /// fails validation.
    pub fn create_session_with_sink(
        &self,
        seed: u64,
        sink: Box<dyn NotificationSink>,
    ) -> Result<HotelSession, EngineError<L::Error>> {
        let data = self
            .data_loader
            .load_hotel_data()
            .map_err(EngineError::Load)?;
        let config = self
            .data_loader
            .load_hotel_config()
            .map_err(EngineError::Load)?;
        Ok(HotelSession::with_sink(seed, &data, config, sink)?)
    }
}
