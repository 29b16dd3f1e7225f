/// Interface to the low-power sleep collaborator.
pub trait SleepController {
    /// Request deep sleep for the given number of minutes.
    ///
    /// On real hardware this powers the system down and does not return;
    /// host and test implementations record the request and return so the
    /// wake-cycle outcome can be observed.
    fn request_deep_sleep(&mut self, minutes: u64);
}
