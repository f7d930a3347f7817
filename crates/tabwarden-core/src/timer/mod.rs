mod model;

pub use model::{
    display_secs, elapsed_secs, format_clock, format_span, remaining_secs, TimerSnapshot,
};
