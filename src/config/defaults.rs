pub(super) const fn default_max_open() -> usize {
    4
}

pub(super) fn default_appname() -> String {
    "QueueBar".to_string()
}

pub(super) const fn default_channel_bound() -> usize {
    16
}
