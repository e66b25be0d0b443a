//! Calibration of a remote sensor through the Group Function protocol.
//!
//! [`session::CalibrationSession`] tracks, for every calibratable item, whether
//! the device reported its current calibration, and builds the requests and
//! commands needed to read or change it. [`service`] wires a session to a
//! [`CanBus`](crate::protocol::transport::traits::can_bus::CanBus): a runner
//! owns the bus and the Fast Packet assembler, a handle serves the user side.
use embassy_time::Duration;

use crate::protocol::group_function::GroupFunctionConfig;
use crate::protocol::messages::{MHU_CALIBRATION, SPEED_CALIBRATION};

pub mod service;
pub mod session;

pub use service::{
    CalibrationHandle, CalibrationRunner, CalibrationService, CalibrationServiceParts,
    OutboundCommand, SharedSession,
};
pub use session::CalibrationSession;

//==================================================================================ITEMS
/// Quantity handled by the session, either reported or calibrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ItemKind {
    ApparentWindAngle,
    ApparentWindSpeed,
    SpeedThroughWater,
    Heading,
    Pitch,
    Roll,
}

impl ItemKind {
    /// Kinds that carry a calibration parameter on the device.
    pub const CALIBRATABLE: [ItemKind; 3] = [
        ItemKind::ApparentWindAngle,
        ItemKind::ApparentWindSpeed,
        ItemKind::SpeedThroughWater,
    ];

    /// Calibration PGN and field index of the kind, if it has one.
    pub const fn calibration(self) -> Option<(u32, usize)> {
        match self {
            ItemKind::ApparentWindAngle => Some((MHU_CALIBRATION, 3)),
            ItemKind::ApparentWindSpeed => Some((MHU_CALIBRATION, 4)),
            ItemKind::SpeedThroughWater => Some((SPEED_CALIBRATION, 3)),
            ItemKind::Heading | ItemKind::Pitch | ItemKind::Roll => None,
        }
    }

    /// Angular kinds are exchanged with the user in degrees.
    pub const fn is_angular(self) -> bool {
        matches!(
            self,
            ItemKind::ApparentWindAngle | ItemKind::Heading | ItemKind::Pitch | ItemKind::Roll
        )
    }
}

/// Calibration knowledge of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ItemState {
    /// No calibration value received since (re)connection.
    Unknown,
    /// The device reported its calibration.
    Known,
    /// A command was sent; waiting for the device to report again.
    PendingCommand,
}

/// Calibration parameter of the remote device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratableItem {
    pub kind: ItemKind,
    pub is_angular: bool,
    pub calibration_pgn: u32,
    /// Index of the parameter in the calibration PGN.
    pub field_index: usize,
    pub state: ItemState,
    /// Last reported value (degrees for angular items).
    pub last_known_calibration: Option<f64>,
    /// Value entered by the user, not yet submitted.
    pub pending_value: Option<f64>,
    /// Address of the device that answered; commands go there.
    pub destination: Option<u8>,
}

impl CalibratableItem {
    /// Item for `kind`, or `None` for data-only kinds.
    pub const fn new(kind: ItemKind) -> Option<Self> {
        match kind.calibration() {
            Some((calibration_pgn, field_index)) => Some(Self {
                kind,
                is_angular: kind.is_angular(),
                calibration_pgn,
                field_index,
                state: ItemState::Unknown,
                last_known_calibration: None,
                pending_value: None,
                destination: None,
            }),
            None => None,
        }
    }

    /// Whether the next tick should ask the device for this item.
    pub fn awaits_report(&self) -> bool {
        matches!(self.state, ItemState::Unknown | ItemState::PendingCommand)
    }
}

//==================================================================================LISTENER
/// Receives what the session learns from the bus.
pub trait CalibrationListener {
    /// Link to the bus went up or down.
    fn on_connection_status(&mut self, connected: bool);
    /// Live measurement (degrees for angles, knots for speeds).
    fn on_value_received(&mut self, kind: ItemKind, value: f64);
    /// Calibration reported by the device (degrees for angular items).
    fn on_calibration_received(&mut self, kind: ItemKind, value: f64);
}

//==================================================================================CONFIG
/// Runtime parameters of a calibration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Source address of the outgoing messages.
    pub source_address: u8,
    /// Manufacturer code of the calibrated device.
    pub manufacturer_code: u16,
    /// Industry code of the calibrated device.
    pub industry_code: u8,
    /// CAN priority of requests and commands.
    pub priority: u8,
    /// Minimum spacing between two requests for the same PGN.
    pub request_interval: Duration,
    /// Period at which the caller invokes `on_tick`.
    pub tick_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source_address: 0x10,
            manufacturer_code: 2020,
            industry_code: 4,
            priority: 2,
            request_interval: Duration::from_secs(1),
            tick_period: Duration::from_secs(1),
        }
    }
}

impl SessionConfig {
    /// Identity used for the group functions built by the session.
    pub fn group_function_config(&self) -> GroupFunctionConfig {
        GroupFunctionConfig {
            source_address: self.source_address,
            manufacturer_code: self.manufacturer_code,
            industry_code: self.industry_code,
            priority: self.priority,
        }
    }

    /// Number of ticks between two request rounds (at least one).
    pub fn ticks_per_request(&self) -> u32 {
        let period = self.tick_period.as_ticks().max(1);
        let ticks = self.request_interval.as_ticks().div_ceil(period).max(1);
        u32::try_from(ticks).unwrap_or(u32::MAX)
    }
}
