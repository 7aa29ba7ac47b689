use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("learnindeep.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("learnindeep.client.request_errors");
pub(crate) static CLIENT_AUTH_FAILURES: Counter =
    Counter::new("learnindeep.client.auth_failures");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("learnindeep.client.request_duration_seconds");

pub(crate) static SESSION_STARTS: Counter = Counter::new("learnindeep.session.starts");
pub(crate) static SESSION_START_FAILURES: Counter =
    Counter::new("learnindeep.session.start_failures");
pub(crate) static SESSION_TURNS: Counter = Counter::new("learnindeep.session.turns");
pub(crate) static SESSION_TURN_FAILURES: Counter =
    Counter::new("learnindeep.session.turn_failures");
pub(crate) static SESSION_RESETS: Counter = Counter::new("learnindeep.session.resets");
pub(crate) static SESSION_TRANSCRIPT_MESSAGES: Moments =
    Moments::new("learnindeep.session.transcript_messages");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_AUTH_FAILURES);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_STARTS);
    collector.register_counter(&SESSION_START_FAILURES);
    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_TURN_FAILURES);
    collector.register_counter(&SESSION_RESETS);
    collector.register_moments(&SESSION_TRANSCRIPT_MESSAGES);
}
