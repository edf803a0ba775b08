mod common;

#[cfg(test)]
mod tests {
    use super::common::{failure, source, Failure};
    use promise_source::Promise;
    use std::sync::{Arc, Mutex};

    /// Records the order in which handlers run.
    #[derive(Clone, Default)]
    struct Steps(Arc<Mutex<Vec<&'static str>>>);

    impl Steps {
        fn push(&self, step: &'static str) {
            self.0.lock().unwrap().push(step);
        }

        fn taken(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn test_then() {
        let source = source::<i32>();
        let steps = Steps::default();

        let (a, b) = (steps.clone(), steps.clone());
        source
            .promise()
            .then(move |_| a.push("first"))
            .then(move |_| b.push("second"));

        source.resolve(42);
        assert_eq!(steps.taken(), vec!["first", "second"]);
    }

    #[test]
    fn test_registration_order_is_delivery_order() {
        let source = source::<i32>();
        let p = source.promise();
        let seen = Arc::new(Mutex::new(vec![]));

        for n in 1..=3 {
            let seen = seen.clone();
            p.then(move |x| seen.lock().unwrap().push((n, x)));
        }
        source.resolve(42);

        assert_eq!(*seen.lock().unwrap(), vec![(1, 42), (2, 42), (3, 42)]);
    }

    #[test]
    fn test_catch() {
        let source = source::<i32>();
        let steps = Steps::default();

        let (a, b) = (steps.clone(), steps.clone());
        source
            .promise()
            .catch(move |_| a.push("first"))
            .catch(move |_| b.push("second"));

        source.reject(failure(42));
        assert_eq!(steps.taken(), vec!["first", "second"]);
    }

    #[test]
    fn test_map() {
        let source = source::<i32>();
        let steps = Steps::default();

        let (a, b, c) = (steps.clone(), steps.clone(), steps.clone());
        let q: Promise<i32, Failure> = source
            .promise()
            .then(move |value| {
                assert_eq!(value, 42);
                a.push("then");
            })
            .map(move |value| {
                assert_eq!(value, 42);
                b.push("map");
                value + 1
            })
            .then(move |value| {
                assert_eq!(value, 43);
                c.push("mapped then");
            });

        source.resolve(42);
        assert_eq!(steps.taken(), vec!["then", "map", "mapped then"]);
        assert_eq!(q.value(), Some(43));
    }

    #[test]
    fn test_map_waits_for_origin_handlers() {
        let source = source::<i32>();
        let p = source.promise();
        let steps = Steps::default();

        let s = steps.clone();
        let q = p.map(move |value| {
            s.push("map");
            value + 1
        });
        let s = steps.clone();
        p.then(move |value| {
            assert_eq!(value, 42);
            s.push("origin then");
        });
        let s = steps.clone();
        q.then(move |value| {
            assert_eq!(value, 43);
            s.push("mapped then");
        });

        source.resolve(42);
        assert_eq!(steps.taken(), vec!["map", "origin then", "mapped then"]);
    }

    #[test]
    fn test_map_error_waits_for_origin_handlers() {
        let source = source::<i32>();
        let p = source.promise();
        let steps = Steps::default();

        let s = steps.clone();
        let q = p.map_error(move |error| {
            assert_eq!(error.code, 42);
            s.push("map_error");
            error.code + 1
        });
        let s = steps.clone();
        p.catch(move |error| {
            assert_eq!(error.code, 42);
            s.push("origin catch");
        });
        let s = steps.clone();
        q.then(move |value| {
            assert_eq!(value, 43);
            s.push("recovered then");
        });

        source.reject(failure(42));
        assert_eq!(
            steps.taken(),
            vec!["map_error", "origin catch", "recovered then"]
        );
    }

    #[test]
    fn test_error_skips_map() {
        let source = source::<i32>();
        let p = source.promise();
        let steps = Steps::default();

        let s = steps.clone();
        let q = p.map(move |value| {
            s.push("map");
            value
        });
        let s = steps.clone();
        p.catch(move |error| {
            assert_eq!(error.code, 42);
            s.push("origin catch");
        });
        let s = steps.clone();
        q.catch(move |error| {
            assert_eq!(error.code, 42);
            s.push("mapped catch");
        });

        source.reject(failure(42));
        assert_eq!(steps.taken(), vec!["origin catch", "mapped catch"]);
    }

    #[test]
    fn test_chained_maps_keep_global_order() {
        let source = source::<i32>();
        let p = source.promise();
        let steps = Steps::default();

        let q = p.map(|x| x + 1);
        let r = q.map(|x| x * 2);
        let s = steps.clone();
        r.then(move |value| {
            assert_eq!(value, 86);
            s.push("r");
        });
        let s = steps.clone();
        q.then(move |_| s.push("q"));
        let s = steps.clone();
        p.then(move |_| s.push("p"));

        source.resolve(42);
        assert_eq!(steps.taken(), vec!["r", "q", "p"]);
        assert_eq!(r.value(), Some(86));
    }

    #[test]
    fn test_long_map_chain_settles_in_order() {
        let source = source::<usize>();
        let p = source.promise();
        let steps = Steps::default();

        let mut last = p.clone();
        for _ in 0..3000 {
            last = last.map(|x| x + 1);
        }
        let s = steps.clone();
        last.then(move |value| {
            assert_eq!(value, 3000);
            s.push("end of chain");
        });
        let s = steps.clone();
        p.then(move |_| s.push("origin"));

        source.resolve(0);
        assert_eq!(steps.taken(), vec!["end of chain", "origin"]);
        assert_eq!(last.value(), Some(3000));
    }

    #[test]
    fn test_long_map_chain_abandoned() {
        let source = source::<usize>();
        let mut last = source.promise();
        for _ in 0..3000 {
            last = last.map(|x| x + 1);
        }
        drop(source);
        assert!(!last.is_settled());
    }

    #[test]
    fn test_flat_map() {
        let source = source::<i32>();
        let steps = Steps::default();

        let (a, b, c) = (steps.clone(), steps.clone(), steps.clone());
        let q = source
            .promise()
            .then(move |_| a.push("then"))
            .flat_map(move |value| {
                b.push("flat_map");
                Promise::of_value(value + 1)
            })
            .then(move |value| {
                assert_eq!(value, 43);
                c.push("flat mapped then");
            });

        source.resolve(42);
        assert_eq!(steps.taken(), vec!["then", "flat_map", "flat mapped then"]);
        assert_eq!(q.value(), Some(43));
    }

    #[test]
    fn test_flat_map_error() {
        let source = source::<i32>();
        let steps = Steps::default();

        let (a, b, c) = (steps.clone(), steps.clone(), steps.clone());
        let q = source
            .promise()
            .catch(move |error| {
                assert_eq!(error.code, 42);
                a.push("catch");
            })
            .flat_map_error(move |error| {
                b.push("flat_map_error");
                Promise::of_error(failure(error.code + 1))
            })
            .catch(move |error| {
                assert_eq!(error.code, 43);
                c.push("flat mapped catch");
            });

        source.reject(failure(42));
        assert_eq!(
            steps.taken(),
            vec!["catch", "flat_map_error", "flat mapped catch"]
        );
        assert_eq!(q.error(), Some(failure(43)));
    }
}
