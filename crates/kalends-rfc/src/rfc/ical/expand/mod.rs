//! Recurrence expansion and time arithmetic.
//!
//! - [`expand`] turns an RRULE and its DTSTART into a lazy occurrence stream
//! - [`TimezoneTable`] resolves TZIDs against a calendar's VTIMEZONEs and the
//!   external zone database
//! - [`TimeContext`] orders instants of mixed forms
//! - [`Merger`] merges sorted streams without materialising them

mod instant;
mod merger;
mod recur;
mod timezone;
mod vtimezone;

pub use instant::{FloatingZone, Instant, TimeContext};
pub use merger::Merger;
pub use recur::{ExpansionError, ExpansionOptions, RecurrenceIter, expand};
pub use timezone::{ResolvedZone, TimezoneTable, normalize_tzid, resolve_external};
pub use vtimezone::{Observance, ObservanceKind, OffsetInfo, Timezone, VTimezoneError};
