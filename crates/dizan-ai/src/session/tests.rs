//! Tests for the submit protocol against scripted completion services.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};

use super::*;
use crate::{CompletionError, CompletionService, Message, ResponseHandle, Role};

enum Reply {
    Single(&'static str),
    Fragments(Vec<Result<String, CompletionError>>),
    Fail(CompletionError),
    HangInvoke,
    HangStream,
}

struct Call {
    prompt: String,
    context: Vec<Message>,
    streaming: bool,
}

#[derive(Default)]
struct ScriptedService {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedService {
    fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    async fn invoke(
        &self,
        context: &[Message],
        prompt: &str,
        streaming: bool,
    ) -> Result<ResponseHandle, CompletionError> {
        self.calls.lock().unwrap().push(Call {
            prompt: prompt.to_string(),
            context: context.to_vec(),
            streaming,
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Reply::Single("ok"));

        match reply {
            Reply::Single(text) => Ok(ResponseHandle::Complete(text.to_string())),
            Reply::Fragments(fragments) => {
                Ok(ResponseHandle::Fragments(stream::iter(fragments).boxed()))
            }
            Reply::Fail(e) => Err(e),
            Reply::HangInvoke => std::future::pending().await,
            Reply::HangStream => Ok(ResponseHandle::Fragments(stream::pending().boxed())),
        }
    }
}

fn quick_options() -> SessionOptions {
    SessionOptions {
        streaming: true,
        timeout: Duration::from_secs(5),
        max_retries: 1,
        retry_delay: Duration::ZERO,
        max_context_exchanges: 50,
    }
}

fn session() -> Session {
    Session::default().with_options(quick_options())
}

async fn wait_until_busy(session: &Session) {
    while !session.is_busy() {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn anxious_scenario_records_one_exchange() {
    let reply = "It sounds like today has been difficult — can you tell me more about what's making you feel anxious?";
    let service = ScriptedService::new(vec![Reply::Single(reply)]);
    let session = session();

    let outcome = session
        .submit(&service, "I feel anxious today")
        .await
        .unwrap();

    assert_eq!(outcome, Submission::Answered(reply.to_string()));
    assert_eq!(
        session.transcript(),
        vec![Turn::user("I feel anxious today"), Turn::assistant(reply)]
    );

    assert_eq!(session.submit(&service, "").await.unwrap(), Submission::Ignored);
    assert_eq!(session.turn_count(), 2);
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn blank_submissions_are_ignored_without_calling_service() {
    let service = ScriptedService::new(vec![]);
    let session = session();

    for blank in ["", "   ", "\n\t"] {
        let outcome = session.submit(&service, blank).await.unwrap();
        assert_eq!(outcome, Submission::Ignored);
    }

    assert!(session.transcript().is_empty());
    assert_eq!(service.call_count(), 0);
}

#[tokio::test]
async fn n_submissions_yield_2n_alternating_turns() {
    let service = ScriptedService::new(vec![]);
    let session = session();

    for i in 0..5 {
        session.submit(&service, &format!("question {i}")).await.unwrap();
    }

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 10);
    for (i, turn) in transcript.iter().enumerate() {
        let expected = if i % 2 == 0 {
            Speaker::User
        } else {
            Speaker::Assistant
        };
        assert_eq!(turn.speaker, expected);
    }
    assert_eq!(transcript[4].text, "question 2");
}

#[tokio::test]
async fn outbound_prompt_carries_preamble_then_question() {
    let service = ScriptedService::new(vec![]);
    let session = Session::new(PersonaPreamble::new("Stay gentle.")).with_options(quick_options());

    session.submit(&service, "why can't I sleep?").await.unwrap();

    let calls = service.calls.lock().unwrap();
    assert_eq!(
        calls[0].prompt,
        "Stay gentle.\nUser: why can't I sleep?\nTherapist:"
    );
    assert!(calls[0].streaming);
}

#[tokio::test]
async fn default_preamble_prefixes_every_prompt() {
    let service = ScriptedService::new(vec![]);
    let session = session();

    session.submit(&service, "one").await.unwrap();
    session.submit(&service, "two").await.unwrap();

    let calls = service.calls.lock().unwrap();
    for (call, question) in calls.iter().zip(["one", "two"]) {
        assert!(call.prompt.starts_with(DEFAULT_PERSONA_PREAMBLE));
        let question_at = call.prompt.find(question).unwrap();
        assert!(question_at >= DEFAULT_PERSONA_PREAMBLE.len());
    }
}

#[tokio::test]
async fn fragments_are_joined_in_delivery_order() {
    let service = ScriptedService::new(vec![Reply::Fragments(vec![
        Ok("Hello".into()),
        Ok(", ".into()),
        Ok("world".into()),
    ])]);
    let session = session();

    let mut seen = Vec::new();
    let outcome = session
        .submit_streaming(&service, "hi", |f| seen.push(f.to_string()))
        .await
        .unwrap();

    assert_eq!(outcome, Submission::Answered("Hello, world".into()));
    assert_eq!(seen, vec!["Hello", ", ", "world"]);
    assert_eq!(session.transcript()[1], Turn::assistant("Hello, world"));
}

#[tokio::test]
async fn service_failure_appends_nothing_and_session_recovers() {
    let service = ScriptedService::new(vec![
        Reply::Fail(CompletionError::Auth("API key not valid".into())),
        Reply::Single("better now"),
    ]);
    let session = session();

    let err = session.submit(&service, "hello?").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Completion(CompletionError::Auth(_))
    ));
    assert!(session.transcript().is_empty());
    assert_eq!(session.context_len(), 0);
    assert!(!session.is_busy());

    session.submit(&service, "hello again").await.unwrap();
    assert_eq!(session.turn_count(), 2);
}

#[tokio::test]
async fn mid_stream_failure_appends_nothing() {
    let service = ScriptedService::new(vec![Reply::Fragments(vec![
        Ok("I hear".into()),
        Err(CompletionError::Network("connection reset".into())),
    ])]);
    let session = session();

    let err = session.submit(&service, "talk to me").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Completion(CompletionError::Network(_))
    ));
    assert!(session.transcript().is_empty());
    // stream failures are not retried
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn transient_invocation_failure_is_retried_once() {
    let service = ScriptedService::new(vec![
        Reply::Fail(CompletionError::Network("dns".into())),
        Reply::Single("second time lucky"),
    ]);
    let session = session();

    let outcome = session.submit(&service, "retry me").await.unwrap();
    assert_eq!(outcome, Submission::Answered("second time lucky".into()));
    assert_eq!(service.call_count(), 2);
    assert_eq!(session.turn_count(), 2);
}

#[tokio::test]
async fn retries_are_bounded() {
    let service = ScriptedService::new(vec![
        Reply::Fail(CompletionError::RateLimited("quota".into())),
        Reply::Fail(CompletionError::RateLimited("quota".into())),
        Reply::Single("unreached"),
    ]);
    let session = session();

    let err = session.submit(&service, "q").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Completion(CompletionError::RateLimited(_))
    ));
    assert_eq!(service.call_count(), 2);
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn permanent_failure_is_not_retried() {
    let service = ScriptedService::new(vec![Reply::Fail(CompletionError::SafetyRejected(
        "SAFETY".into(),
    ))]);
    let session = session();

    assert!(session.submit(&service, "q").await.is_err());
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn hung_invocation_times_out() {
    let service = ScriptedService::new(vec![Reply::HangInvoke]);
    let session = Session::default().with_options(SessionOptions {
        timeout: Duration::from_millis(20),
        max_retries: 0,
        ..quick_options()
    });

    let err = session.submit(&service, "anyone there?").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Completion(CompletionError::Timeout(_))
    ));
    assert!(session.transcript().is_empty());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn hung_stream_times_out() {
    let service = ScriptedService::new(vec![Reply::HangStream]);
    let session = Session::default().with_options(SessionOptions {
        timeout: Duration::from_millis(20),
        ..quick_options()
    });

    let err = session.submit(&service, "q").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Completion(CompletionError::Timeout(_))
    ));
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn concurrent_submit_is_rejected_and_cancel_appends_nothing() {
    let service = Arc::new(ScriptedService::new(vec![Reply::HangStream]));
    let session = Arc::new(session());

    let first = {
        let session = session.clone();
        let service = service.clone();
        tokio::spawn(async move { session.submit(service.as_ref(), "first").await })
    };
    wait_until_busy(&session).await;

    let second = session.submit(service.as_ref(), "second").await;
    assert!(matches!(second, Err(SessionError::Busy)));

    assert!(session.cancel());
    let first = first.await.unwrap();
    assert!(matches!(first, Err(SessionError::Cancelled)));

    assert!(session.transcript().is_empty());
    assert!(!session.is_busy());
    assert!(!session.cancel());

    session.submit(service.as_ref(), "third").await.unwrap();
    assert_eq!(session.transcript()[0], Turn::user("third"));
}

#[tokio::test]
async fn dropped_submission_appends_nothing_and_releases_busy() {
    let service = ScriptedService::new(vec![Reply::HangStream]);
    let session = session();

    let result =
        tokio::time::timeout(Duration::from_millis(20), session.submit(&service, "q")).await;
    assert!(result.is_err());

    assert!(!session.is_busy());
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn model_context_grows_with_each_exchange() {
    let service = ScriptedService::new(vec![Reply::Single("a1"), Reply::Single("a2")]);
    let session = session();

    session.submit(&service, "q1").await.unwrap();
    session.submit(&service, "q2").await.unwrap();

    let calls = service.calls.lock().unwrap();
    assert!(calls[0].context.is_empty());
    assert_eq!(calls[1].context.len(), 2);
    assert_eq!(calls[1].context[0].role, Role::User);
    assert_eq!(calls[1].context[0].content, calls[0].prompt);
    assert_eq!(calls[1].context[1], Message::model("a1"));
    assert_eq!(session.context_len(), 4);
}

#[tokio::test]
async fn model_context_drops_oldest_exchanges_past_the_cap() {
    let service = ScriptedService::new(vec![]);
    let session = Session::default().with_options(SessionOptions {
        max_context_exchanges: 2,
        ..quick_options()
    });

    for q in ["q1", "q2", "q3", "q4"] {
        session.submit(&service, q).await.unwrap();
    }

    let calls = service.calls.lock().unwrap();
    assert_eq!(calls[2].context.len(), 4);
    assert_eq!(calls[3].context.len(), 4);
    assert_eq!(calls[3].context[0].content, calls[1].prompt);
    assert_eq!(session.context_len(), 4);
    assert_eq!(session.turn_count(), 8);
    assert_eq!(session.transcript()[0], Turn::user("q1"));
}

#[tokio::test]
async fn reservation_blocks_submits_until_released() {
    let service = ScriptedService::new(vec![]);
    let session = session();

    let reservation = session.reserve().unwrap();
    assert!(session.is_busy());
    assert!(matches!(session.reserve(), Err(SessionError::Busy)));
    assert!(matches!(
        session.submit(&service, "jump the queue").await,
        Err(SessionError::Busy)
    ));

    let outcome = session
        .submit_reserved(reservation, &service, "my turn", |_| {})
        .await
        .unwrap();
    assert_eq!(outcome, Submission::Answered("ok".into()));
    assert!(!session.is_busy());
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn dropped_reservation_frees_the_session() {
    let service = ScriptedService::new(vec![]);
    let session = session();

    drop(session.reserve().unwrap());
    assert!(!session.is_busy());
    session.submit(&service, "q").await.unwrap();
    assert_eq!(session.turn_count(), 2);
}

#[tokio::test]
async fn reservation_from_another_session_is_refused() {
    let service = ScriptedService::new(vec![]);
    let alice = session();
    let bob = session();

    let reservation = alice.reserve().unwrap();
    let err = bob
        .submit_reserved(reservation, &service, "q", |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Busy));
    assert_eq!(service.call_count(), 0);
    assert!(bob.transcript().is_empty());
    assert!(!alice.is_busy());
}

#[tokio::test]
async fn sessions_do_not_share_context() {
    let service = ScriptedService::new(vec![]);
    let alice = session();
    let bob = session();

    alice.submit(&service, "alice's secret").await.unwrap();
    bob.submit(&service, "bob's question").await.unwrap();

    let calls = service.calls.lock().unwrap();
    assert!(calls[1].context.is_empty());
    assert!(!calls[1].prompt.contains("alice"));
    assert_eq!(bob.turn_count(), 2);
    assert_eq!(alice.transcript()[0].text, "alice's secret");
}

#[tokio::test]
async fn non_streaming_option_is_forwarded() {
    let service = ScriptedService::new(vec![]);
    let session = Session::default().with_options(SessionOptions {
        streaming: false,
        ..quick_options()
    });

    session.submit(&service, "q").await.unwrap();
    assert!(!service.calls.lock().unwrap()[0].streaming);
}

#[test]
fn sessions_get_distinct_ids() {
    assert_ne!(Session::default().id(), Session::default().id());
}
