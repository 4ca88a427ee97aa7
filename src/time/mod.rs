//! Time handling
//!
//! - **window**: half-open UTC query windows
//! - **zone**: local calendar dates → UTC windows, UTC instants → local labels
//! - **clock**: injectable "now"

mod clock;
mod window;
mod zone;

pub use clock::{Clock, FixedClock, SystemClock};
pub use window::TimeWindow;
pub use zone::{
    date_label, InvalidDate, ZoneResolver, CLOCK_LABEL_FORMAT, DATE_FORMAT, DAY_LABEL_FORMAT,
    TIMESTAMP_LABEL_FORMAT,
};
