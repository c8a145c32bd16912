pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use herald::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_request_resolves_with_responder_answer() {
        let bus = Herald::new();
        let test = bus.add_topic("TEST").unwrap().get("TEST").unwrap();

        let responder = bus.clone();
        bus.listen_once(&test, move |payload| {
            if let Some(request) = payload.as_request() {
                assert_eq!(request.query.as_text(), Some("hello"));
                responder.respond(&request.tracking, "world");
            }
        })
        .unwrap();

        let answer = bus.request(&test, "hello").await.unwrap();
        assert_eq!(answer.as_text(), Some("world"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_times_out_without_responder() {
        let bus = Herald::new();
        let test = bus.add_topic("TEST").unwrap().get("TEST").unwrap();
        bus.set_request_ttl(Duration::from_millis(50)).unwrap();

        let err = bus.request(&test, "hello").await.unwrap_err();
        assert!(matches!(err, HeraldError::RequestTimeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_respond_is_a_safe_no_op() {
        let bus = Herald::new();
        let test = bus.add_topic("TEST").unwrap().get("TEST").unwrap();
        bus.set_request_ttl(Duration::from_millis(20)).unwrap();

        let recorder = Recorder::new();
        bus.listen(&test, recorder.callback()).unwrap();

        let err = bus.request(&test, "hello").await.unwrap_err();
        assert!(matches!(err, HeraldError::RequestTimeout { .. }));

        // The tracking number is known from the observed envelope; a
        // response after timeout changes nothing and raises nothing.
        drain().await;
        let seen = recorder.seen();
        let envelope = seen[0].as_request().unwrap().clone();
        bus.respond(&envelope.tracking, "too late");
        drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_on_foreign_token_rejects_via_future() {
        let bus = Herald::new();
        let other = Herald::new();
        let foreign = other.add_topic("TEST").unwrap().get("TEST").unwrap();

        let err = bus.request(&foreign, "hello").await.unwrap_err();
        assert!(matches!(err, HeraldError::InvalidTopic { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_get_distinct_tracking_numbers() {
        let bus = Herald::new();
        let test = bus.add_topic("TEST").unwrap().get("TEST").unwrap();

        let observed = Arc::new(Mutex::new(Vec::new()));
        let responder = bus.clone();
        let log = observed.clone();
        // A single persistent listener serves every request, echoing the
        // tracking number back as the answer.
        bus.listen(&test, move |payload| {
            if let Some(request) = payload.as_request() {
                log.lock().unwrap().push(request.tracking.clone());
                responder.respond(&request.tracking, request.tracking.as_str());
            }
        })
        .unwrap();

        let a = bus.request(&test, 1);
        let b = bus.request(&test, 2);
        let c = bus.request(&test, 3);

        let (a, b, c) = tokio::join!(a, b, c);
        let answers = [a.unwrap(), b.unwrap(), c.unwrap()];

        let observed = observed.lock().unwrap().clone();
        assert_eq!(observed.len(), 3);
        assert_ne!(observed[0], observed[1]);
        assert_ne!(observed[1], observed[2]);
        assert_ne!(observed[0], observed[2]);

        // Each reply is correlated to its own request.
        let mut echoed: Vec<_> =
            answers.iter().map(|answer| answer.as_text().unwrap().to_owned()).collect();
        let mut minted: Vec<_> =
            observed.iter().map(|tracking| tracking.as_str().to_owned()).collect();
        echoed.sort();
        minted.sort();
        assert_eq!(echoed, minted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_change_spares_armed_timers() {
        let bus = Herald::new();
        let test = bus.add_topic("TEST").unwrap().get("TEST").unwrap();
        bus.set_request_ttl(Duration::from_millis(200)).unwrap();

        let recorder = Recorder::new();
        bus.listen(&test, recorder.callback()).unwrap();

        let reply = bus.request(&test, "slow");
        bus.set_request_ttl(Duration::from_millis(10)).unwrap();

        // Well past the new TTL but inside the one the request was armed
        // with; the request must still be answerable.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let envelope = recorder.seen()[0].as_request().unwrap().clone();
        bus.respond(&envelope.tracking, "answered");

        let answer = reply.await.unwrap();
        assert_eq!(answer.as_text(), Some("answered"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_settles_exactly_once() {
        let bus = Herald::new();
        let test = bus.add_topic("TEST").unwrap().get("TEST").unwrap();
        bus.set_request_ttl(Duration::from_millis(100)).unwrap();

        let responder = bus.clone();
        bus.listen(&test, move |payload| {
            if let Some(request) = payload.as_request() {
                // Double response: only the first can win.
                responder.respond(&request.tracking, "first");
                responder.respond(&request.tracking, "second");
            }
        })
        .unwrap();

        let answer = bus.request(&test, "race").await.unwrap();
        assert_eq!(answer.as_text(), Some("first"));

        // And the armed timer firing later must not do anything either.
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_lets_pending_requests_time_out() {
        let bus = Herald::new();
        let test = bus.add_topic("TEST").unwrap().get("TEST").unwrap();
        bus.set_request_ttl(Duration::from_millis(30)).unwrap();

        let responder = bus.clone();
        bus.listen(&test, move |payload| {
            if let Some(request) = payload.as_request() {
                responder.respond(&request.tracking, "ignored");
            }
        })
        .unwrap();

        let reply = bus.request(&test, "doomed");
        // Drops the topic listener and the internal reply listener before
        // any delivery ran.
        bus.cancel_all();

        let err = reply.await.unwrap_err();
        assert!(matches!(err, HeraldError::RequestTimeout { .. }));
    }
}
