// Extra timer logging
#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}

#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        // Nothing
    };
}

// TREE LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_tree")]
macro_rules! tree_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_tree"))]
macro_rules! tree_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// LAYOUT LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_layout")]
macro_rules! layout_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_layout"))]
macro_rules! layout_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}

// MEMORY ACCESS LOGGING MACROS
#[macro_export]
#[cfg(feature = "show_access")]
macro_rules! access_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_access"))]
macro_rules! access_log {
    ($($arg:tt)*) => {
        // Nothing
    };
}
