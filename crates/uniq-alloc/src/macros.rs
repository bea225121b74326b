macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "log")]
        {
            uniq_log::debug!($($arg)*);
        }
    };
}
