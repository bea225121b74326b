macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        {
            uniq_log::trace!($($arg)*);
        }
    };
}

macro_rules! warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        {
            uniq_log::warn!($($arg)*);
        }
    };
}
