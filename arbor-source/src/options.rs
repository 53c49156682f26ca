/// Configuration knobs for data source adapters.
#[derive(Clone, Debug, Default)]
pub struct DataSourceOptions {
    /// Capacity of each subscriber's change channel (`None` means
    /// unbounded). A full channel drops its oldest queued update so the
    /// newest one still reaches the subscriber.
    pub change_capacity: Option<usize>,
}

impl DataSourceOptions {
    /// Keep at most `capacity` unread updates per subscriber.
    #[must_use]
    pub fn with_change_capacity(mut self, capacity: usize) -> Self {
        self.change_capacity = Some(capacity.max(1));
        self
    }
}
