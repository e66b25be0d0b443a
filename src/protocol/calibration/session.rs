//! Calibration session: per-item state machine and PGN dispatch.
//!
//! ```text
//!   Unknown ──report──▶ Known ──submit/reset──▶ PendingCommand
//!      ▲                  ▲                          │
//!      └──(re)connect     └─────────report───────────┘
//! ```
use core::f64::consts::PI;

use super::{CalibratableItem, CalibrationListener, ItemKind, ItemState, SessionConfig};
use crate::core::Availability;
use crate::error::SessionError;
use crate::infra::codec::fields::PgnFields;
use crate::protocol::group_function::GroupFunctionBuilder;
use crate::protocol::messages::schema::SchemaProvider;
use crate::protocol::messages::{
    PgnMessage, ATTITUDE, MHU_CALIBRATION, SPEED, SPEED_CALIBRATION, VESSEL_HEADING, WIND_DATA,
};

/// Number of calibratable items managed by a session.
pub const ITEM_COUNT: usize = ItemKind::CALIBRATABLE.len();

const KNOTS_PER_METER_PER_SECOND: f64 = 3600.0 / 1852.0;
const DEGREES_PER_RADIAN: f64 = 180.0 / PI;

// Slot positions of the vendor identification in the calibration PGNs.
const SLOT_MANUFACTURER: usize = 0;
const SLOT_INDUSTRY: usize = 2;

//==================================================================================ROUTES
/// Conversion applied to a decoded value before it reaches the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Degrees,
    Knots,
    Raw,
}

impl Unit {
    fn convert(self, value: f64) -> f64 {
        match self {
            Unit::Degrees => value * DEGREES_PER_RADIAN,
            Unit::Knots => value * KNOTS_PER_METER_PER_SECOND,
            Unit::Raw => value,
        }
    }
}

/// Field of a data PGN reported as a live value.
#[derive(Debug)]
struct Binding {
    field_index: usize,
    kind: ItemKind,
    unit: Unit,
}

#[derive(Debug)]
enum Handler {
    /// Live measurements.
    Data(&'static [Binding]),
    /// Calibration report for every item bound to this PGN.
    Calibration,
}

#[derive(Debug)]
struct Route {
    pgn: u32,
    handler: Handler,
}

/// Dispatch table, sorted by PGN.
static ROUTES: [Route; 6] = [
    Route {
        pgn: VESSEL_HEADING,
        handler: Handler::Data(&[Binding {
            field_index: 1,
            kind: ItemKind::Heading,
            unit: Unit::Degrees,
        }]),
    },
    Route {
        pgn: ATTITUDE,
        handler: Handler::Data(&[
            Binding {
                field_index: 2,
                kind: ItemKind::Pitch,
                unit: Unit::Degrees,
            },
            Binding {
                field_index: 3,
                kind: ItemKind::Roll,
                unit: Unit::Degrees,
            },
        ]),
    },
    Route {
        pgn: SPEED,
        handler: Handler::Data(&[Binding {
            field_index: 1,
            kind: ItemKind::SpeedThroughWater,
            unit: Unit::Knots,
        }]),
    },
    Route {
        pgn: WIND_DATA,
        handler: Handler::Data(&[
            Binding {
                field_index: 1,
                kind: ItemKind::ApparentWindSpeed,
                unit: Unit::Knots,
            },
            Binding {
                field_index: 2,
                kind: ItemKind::ApparentWindAngle,
                unit: Unit::Degrees,
            },
        ]),
    },
    Route {
        pgn: MHU_CALIBRATION,
        handler: Handler::Calibration,
    },
    Route {
        pgn: SPEED_CALIBRATION,
        handler: Handler::Calibration,
    },
];

fn route(pgn: u32) -> Option<&'static Route> {
    ROUTES
        .binary_search_by_key(&pgn, |route| route.pgn)
        .ok()
        .map(|index| &ROUTES[index])
}

//==================================================================================SESSION
const fn calibratable(kind: ItemKind) -> CalibratableItem {
    match CalibratableItem::new(kind) {
        Some(item) => item,
        None => panic!("kind has no calibration parameter"),
    }
}

/// Initial items, in `ItemKind::CALIBRATABLE` order.
const ITEMS: [CalibratableItem; ITEM_COUNT] = [
    calibratable(ItemKind::CALIBRATABLE[0]),
    calibratable(ItemKind::CALIBRATABLE[1]),
    calibratable(ItemKind::CALIBRATABLE[2]),
];

/// Explicit context object owning the calibration state of one device.
pub struct CalibrationSession<S: SchemaProvider, L: CalibrationListener> {
    schema: S,
    listener: L,
    config: SessionConfig,
    items: [CalibratableItem; ITEM_COUNT],
    connected: bool,
    /// Ticks left before the next request round.
    ticks_until_request: u32,
}

impl<S: SchemaProvider, L: CalibrationListener> CalibrationSession<S, L> {
    pub fn new(schema: S, listener: L, config: SessionConfig) -> Self {
        Self {
            schema,
            listener,
            config,
            items: ITEMS,
            connected: false,
            ticks_until_request: 0,
        }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn items(&self) -> &[CalibratableItem] {
        &self.items
    }

    /// Item bound to `kind`, `None` for data-only kinds.
    pub fn item(&self, kind: ItemKind) -> Option<&CalibratableItem> {
        self.items.iter().find(|item| item.kind == kind)
    }

    //==========================================TRANSPORT EVENTS
    /// Record the link state. Every (re)connection forgets what the device
    /// reported so the next tick asks again.
    pub fn on_connection_status(&mut self, connected: bool) {
        if connected && !self.connected {
            for item in self.items.iter_mut() {
                item.state = ItemState::Unknown;
            }
            self.ticks_until_request = 0;
        }
        self.connected = connected;
        #[cfg(feature = "defmt")]
        defmt::info!("Calibration link connected: {}", connected);
        self.listener.on_connection_status(connected);
    }

    /// Periodic tick: one request per calibration PGN that still has an item
    /// waiting for a report. Returns the number of messages handed to `emit`.
    pub fn on_tick(&mut self, mut emit: impl FnMut(PgnMessage)) -> usize {
        if !self.connected {
            return 0;
        }
        if self.ticks_until_request > 0 {
            self.ticks_until_request -= 1;
            return 0;
        }

        let builder = GroupFunctionBuilder::new(&self.schema, self.config.group_function_config());
        let mut emitted = 0;
        for (index, item) in self.items.iter().enumerate() {
            if !item.awaits_report() {
                continue;
            }
            let already_requested = self.items[..index]
                .iter()
                .any(|prev| prev.awaits_report() && prev.calibration_pgn == item.calibration_pgn);
            if already_requested {
                continue;
            }
            match builder.build_request(item.calibration_pgn) {
                Ok(request) => {
                    emit(request);
                    emitted += 1;
                }
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Request for PGN {} failed: {}", item.calibration_pgn, _err);
                }
            }
        }
        if emitted > 0 {
            self.ticks_until_request = self.config.ticks_per_request() - 1;
        }
        emitted
    }

    /// Dispatch a received message through the route table. Unknown PGNs,
    /// undecodable payloads and mismatching fields are skipped.
    pub fn on_message(&mut self, message: &PgnMessage) {
        let Some(route) = route(message.pgn()) else {
            return;
        };
        let Some(descriptor) = message
            .schema()
            .or_else(|| self.schema.resolve(message.pgn(), message.payload()))
        else {
            return;
        };
        let fields = match PgnFields::decode(descriptor, message.payload(), &self.schema) {
            Ok(fields) => fields,
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("PGN {} dropped: {}", message.pgn(), _err);
                return;
            }
        };

        match route.handler {
            Handler::Data(bindings) => {
                for binding in bindings {
                    if let Some(value) = available_decimal(&fields, binding.field_index) {
                        self.listener
                            .on_value_received(binding.kind, binding.unit.convert(value));
                    }
                }
            }
            Handler::Calibration => self.on_calibration(message, &fields),
        }
    }

    fn on_calibration(&mut self, message: &PgnMessage, fields: &PgnFields) {
        let vendor = |slot: usize| fields.field(slot).and_then(|f| f.int()).ok();
        if vendor(SLOT_MANUFACTURER) != Some(self.config.manufacturer_code as i64)
            || vendor(SLOT_INDUSTRY) != Some(self.config.industry_code as i64)
        {
            return;
        }

        for item in self
            .items
            .iter_mut()
            .filter(|item| item.calibration_pgn == message.pgn())
        {
            item.state = ItemState::Known;
            item.destination = Some(message.source());
            let unit = if item.is_angular { Unit::Degrees } else { Unit::Raw };
            if let Some(value) = available_decimal(fields, item.field_index) {
                let value = unit.convert(value);
                item.last_known_calibration = Some(value);
                self.listener.on_calibration_received(item.kind, value);
            }
        }
    }

    //==========================================USER ACTIONS
    /// Store the value the user wants (degrees for angular items).
    pub fn set_pending(&mut self, kind: ItemKind, value: f64) -> Result<(), SessionError> {
        self.item_mut(kind)?.pending_value = Some(value);
        Ok(())
    }

    /// Build the command writing the pending value to the device.
    pub fn submit(&mut self, kind: ItemKind) -> Result<PgnMessage, SessionError> {
        let item = *self.item_mut(kind)?;
        let pending = item.pending_value.ok_or(SessionError::NoPendingValue)?;
        let destination = item.destination.ok_or(SessionError::DestinationUnknown)?;
        let value = if item.is_angular {
            pending / DEGREES_PER_RADIAN
        } else {
            pending
        };

        let command = self.builder().build_command(
            item.calibration_pgn,
            destination,
            item.field_index,
            value,
        )?;
        let item = self.item_mut(kind)?;
        item.pending_value = None;
        item.state = ItemState::PendingCommand;
        Ok(command)
    }

    /// Build the command restoring the device default for `kind`.
    pub fn reset(&mut self, kind: ItemKind) -> Result<PgnMessage, SessionError> {
        let item = *self.item_mut(kind)?;
        let destination = item.destination.ok_or(SessionError::DestinationUnknown)?;
        let command =
            self.builder()
                .build_reset(item.calibration_pgn, destination, item.field_index)?;
        let item = self.item_mut(kind)?;
        item.pending_value = None;
        item.state = ItemState::PendingCommand;
        Ok(command)
    }

    fn builder(&self) -> GroupFunctionBuilder<'_, S> {
        GroupFunctionBuilder::new(&self.schema, self.config.group_function_config())
    }

    fn item_mut(&mut self, kind: ItemKind) -> Result<&mut CalibratableItem, SessionError> {
        self.items
            .iter_mut()
            .find(|item| item.kind == kind)
            .ok_or(SessionError::NotCalibratable)
    }
}

/// Decimal value of slot `index`, `None` when missing, unavailable or not numeric.
fn available_decimal(fields: &PgnFields, index: usize) -> Option<f64> {
    let field = fields.field(index).ok()?;
    if field.availability() != Availability::Available {
        return None;
    }
    field.decimal().ok()
}
