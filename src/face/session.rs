use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use super::matcher::{FaceCandidate, FaceMatch, best_match};

/// Lifecycle of one recognition session at a clock terminal. `Matched` and
/// `Cancelled` both refuse further frames until the session is re-armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanState {
    Idle,
    Scanning,
    Matched,
    Cancelled,
}

/// What happened to a submitted frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Matched(FaceMatch),
    NoMatch,
    /// The session was no longer scanning when the frame arrived. This is
    /// the stale-detection guard: an in-flight frame from before a match or
    /// a cancellation is dropped here, never accepted.
    Rejected(ScanState),
}

#[derive(Debug)]
pub struct ScanSession {
    state: ScanState,
    min_score: u8,
    matched: Option<FaceMatch>,
    frames_seen: u32,
}

impl ScanSession {
    pub fn new(min_score: u8) -> Self {
        Self {
            state: ScanState::Idle,
            min_score,
            matched: None,
            frames_seen: 0,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn matched(&self) -> Option<&FaceMatch> {
        self.matched.as_ref()
    }

    pub fn frames_seen(&self) -> u32 {
        self.frames_seen
    }

    /// Arms (or re-arms) the session. Clears any previous match, so a
    /// terminal can scan the next person after a failed or completed cycle.
    pub fn start(&mut self) {
        self.state = ScanState::Scanning;
        self.matched = None;
        self.frames_seen = 0;
    }

    /// Stops the session immediately. The terminal releases its camera; any
    /// detection still in flight will be rejected on arrival.
    pub fn cancel(&mut self) {
        self.state = ScanState::Cancelled;
    }

    /// Runs one detected frame against the roster. Only a `Scanning` session
    /// accepts frames; the state check happens here, at the single point
    /// where a match could be committed.
    pub fn submit_frame(&mut self, live: &[f32], roster: &[FaceCandidate]) -> FrameOutcome {
        if self.state != ScanState::Scanning {
            return FrameOutcome::Rejected(self.state);
        }

        self.frames_seen += 1;

        match best_match(live, roster, self.min_score) {
            Some(m) => {
                self.state = ScanState::Matched;
                self.matched = Some(m.clone());
                FrameOutcome::Matched(m)
            }
            None => FrameOutcome::NoMatch,
        }
    }
}

/// Polls a frame source at a fixed interval until the session matches or is
/// cancelled. The source yields `None` when no face is in view. Cancellation
/// is checked both before asking for a frame and (inside `submit_frame`)
/// before committing its result, so a detection that was already in flight
/// when the operator cancelled can never produce a match.
pub async fn drive<F, Fut>(
    session: &Mutex<ScanSession>,
    roster: &[FaceCandidate],
    poll_interval: Duration,
    mut next_frame: F,
) -> Option<FaceMatch>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<Vec<f32>>>,
{
    loop {
        actix_web::rt::time::sleep(poll_interval).await;

        if session.lock().expect("scan session poisoned").state() != ScanState::Scanning {
            return None;
        }

        let Some(live) = next_frame().await else {
            continue;
        };

        let outcome = session
            .lock()
            .expect("scan session poisoned")
            .submit_frame(&live, roster);

        match outcome {
            FrameOutcome::Matched(m) => return Some(m),
            FrameOutcome::NoMatch => {}
            FrameOutcome::Rejected(_) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::matcher::MIN_MATCH_SCORE;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn roster_of(id: &str, descriptor: Vec<f32>) -> Vec<FaceCandidate> {
        vec![FaceCandidate {
            employee_id: id.to_string(),
            name: id.to_uppercase(),
            descriptor,
        }]
    }

    #[test]
    fn full_cycle_idle_scanning_matched() {
        let live = vec![0.2f32; 128];
        let roster = roster_of("emp", live.clone());
        let mut session = ScanSession::new(MIN_MATCH_SCORE);

        assert_eq!(session.state(), ScanState::Idle);
        // frames before start are rejected
        assert_eq!(
            session.submit_frame(&live, &roster),
            FrameOutcome::Rejected(ScanState::Idle)
        );

        session.start();
        assert_eq!(session.state(), ScanState::Scanning);

        match session.submit_frame(&live, &roster) {
            FrameOutcome::Matched(m) => assert_eq!(m.employee_id, "emp"),
            other => panic!("expected match, got {other:?}"),
        }
        assert_eq!(session.state(), ScanState::Matched);
    }

    #[test]
    fn frames_after_match_are_rejected() {
        let live = vec![0.2f32; 128];
        let roster = roster_of("emp", live.clone());
        let mut session = ScanSession::new(MIN_MATCH_SCORE);
        session.start();
        session.submit_frame(&live, &roster);

        // a stale in-flight detection arriving after the match
        assert_eq!(
            session.submit_frame(&live, &roster),
            FrameOutcome::Rejected(ScanState::Matched)
        );
    }

    #[test]
    fn cancel_stops_accepting_and_restart_rearms() {
        let live = vec![0.2f32; 128];
        let roster = roster_of("emp", live.clone());
        let mut session = ScanSession::new(MIN_MATCH_SCORE);

        session.start();
        session.cancel();
        assert_eq!(
            session.submit_frame(&live, &roster),
            FrameOutcome::Rejected(ScanState::Cancelled)
        );

        session.start();
        assert_eq!(session.state(), ScanState::Scanning);
        assert!(matches!(
            session.submit_frame(&live, &roster),
            FrameOutcome::Matched(_)
        ));
    }

    #[test]
    fn no_match_keeps_scanning() {
        let live = vec![0.0f32; 128];
        let mut far = live.clone();
        far[0] = 0.55;
        let roster = roster_of("far", far);

        let mut session = ScanSession::new(MIN_MATCH_SCORE);
        session.start();
        assert_eq!(session.submit_frame(&live, &roster), FrameOutcome::NoMatch);
        assert_eq!(session.state(), ScanState::Scanning);
        assert_eq!(session.frames_seen(), 1);
    }

    #[actix_web::test]
    async fn drive_polls_until_the_source_yields_a_match() {
        let live = vec![0.3f32; 128];
        let roster = roster_of("emp", live.clone());
        let session = Mutex::new(ScanSession::new(MIN_MATCH_SCORE));
        session.lock().unwrap().start();

        let calls = AtomicU32::new(0);
        let result = drive(&session, &roster, Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let frame = if n < 2 { None } else { Some(live.clone()) };
            async move { frame }
        })
        .await;

        assert_eq!(result.unwrap().employee_id, "emp");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[actix_web::test]
    async fn drive_drops_a_detection_that_raced_a_cancellation() {
        let live = vec![0.3f32; 128];
        let roster = roster_of("emp", live.clone());
        let session = Mutex::new(ScanSession::new(MIN_MATCH_SCORE));
        session.lock().unwrap().start();

        // the operator cancels while this detection is in flight
        let result = drive(&session, &roster, Duration::from_millis(1), || {
            session.lock().unwrap().cancel();
            let frame = Some(live.clone());
            async move { frame }
        })
        .await;

        assert!(result.is_none());
        assert_eq!(session.lock().unwrap().state(), ScanState::Cancelled);
    }
}
