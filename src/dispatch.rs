//! Start-up wiring of the real-time dispatch core.

use std::sync::Arc;

use crate::domain::DONATION_PAYED;
use crate::events::{DonationPayedHandler, EventBus, EventBusError};
use crate::hub::{Hub, HubConfig};

/// Starts the hub loop and the event dispatcher on the current runtime.
///
/// The hub is running before the dispatcher starts, so no handler can
/// ever deliver into a loop that is not draining its queues. Both tasks
/// stop on their own once every returned handle has been dropped.
///
/// # Errors
///
/// Returns [`EventBusError`] if a handler name is registered twice.
pub fn spawn_dispatch_core(
    hub_config: HubConfig,
    bus_capacity: usize,
) -> Result<(Hub, EventBus), EventBusError> {
    let hub = Hub::spawn(hub_config);

    let (event_bus, mut dispatcher) = EventBus::new(bus_capacity);
    dispatcher.register_handler(
        Arc::new(DonationPayedHandler::new(hub.clone())),
        DONATION_PAYED,
    )?;
    tokio::spawn(dispatcher.run());

    Ok((hub, event_bus))
}
