//! In-memory person collection with loading and error tracking.
//!
//! # Design
//! `PersonStore` owns an `ApiClient` and the observable `CollectionState`.
//! Every action follows one contract: raise `loading` and clear the previous
//! `error`, invoke the adapter, reconcile the collection on success or record
//! the failure message, then drop `loading`. Observers registered with
//! `subscribe` run after each of those transitions. Fetching swallows
//! failures (the view degrades to an empty list plus the error message);
//! mutations re-raise them so the calling flow stops.
//!
//! Actions take `&mut self`: one store instance runs one action at a time,
//! and overlapping actions on shared state cannot be expressed.

use tracing::error;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{Person, PersonInput};

/// Observable state of the person collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    /// Person records in server order, never re-sorted locally.
    pub persons: Vec<Person>,
    /// True only while an action is in flight.
    pub loading: bool,
    /// Message of the most recent failed action. Cleared when the next
    /// action begins or by [`PersonStore::clear_error`].
    pub error: Option<String>,
}

/// Callback observing the state after every transition.
pub type Subscriber = Box<dyn FnMut(&CollectionState)>;

/// Cache of person records kept in sync with the API through CRUD actions.
///
/// Stores are plain values handed to whoever needs one, so tests construct
/// isolated instances against scripted transports.
pub struct PersonStore {
    api: ApiClient,
    state: CollectionState,
    subscribers: Vec<Subscriber>,
}

impl PersonStore {
    /// Store backed by the given client, starting empty and idle.
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: CollectionState::default(),
            subscribers: Vec::new(),
        }
    }

    pub fn persons(&self) -> &[Person] {
        &self.state.persons
    }

    pub fn loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    /// Register a callback observing every state transition. Each action
    /// notifies twice: when it begins and when it settles.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&CollectionState) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// First person whose last name matches, scanning in collection order.
    pub fn find_by_last_name(&self, last_name: &str) -> Option<&Person> {
        self.state.persons.iter().find(|p| p.last_name == last_name)
    }

    /// Replace the collection with the server's current sequence.
    ///
    /// Failures are not returned: the collection stays as it was and the
    /// message lands in `error`.
    pub fn fetch_all(&mut self) {
        self.begin();
        match self.api.get_persons() {
            Ok(persons) => self.state.persons = persons,
            Err(e) => {
                error!(error = %e, "fetching persons failed");
                self.state.error = Some(e.to_string());
            }
        }
        self.settle();
    }

    /// Create a person, appending the server-returned record.
    pub fn create(&mut self, input: &PersonInput) -> Result<Person, ApiError> {
        self.begin();
        let result = self.api.create_person(input);
        match &result {
            Ok(person) => self.state.persons.push(person.clone()),
            Err(e) => {
                error!(error = %e, "creating person failed");
                self.state.error = Some(e.to_string());
            }
        }
        self.settle();
        result
    }

    /// Replace the writable fields of the person with this id.
    ///
    /// The collection entry matching `id` is swapped for the server's
    /// record; when no entry matches, the collection is left untouched and
    /// the record is still returned.
    pub fn update(&mut self, id: i64, input: &PersonInput) -> Result<Person, ApiError> {
        self.begin();
        let result = self.api.update_person(id, input);
        match &result {
            Ok(person) => {
                if let Some(entry) = self.state.persons.iter_mut().find(|p| p.id == id) {
                    *entry = person.clone();
                }
            }
            Err(e) => {
                error!(error = %e, "updating person failed");
                self.state.error = Some(e.to_string());
            }
        }
        self.settle();
        result
    }

    /// Delete the person with this id, dropping it from the collection and
    /// preserving the order of the rest.
    pub fn remove(&mut self, id: i64) -> Result<(), ApiError> {
        self.begin();
        let result = self.api.delete_person(id);
        match &result {
            Ok(()) => self.state.persons.retain(|p| p.id != id),
            Err(e) => {
                error!(error = %e, "deleting person failed");
                self.state.error = Some(e.to_string());
            }
        }
        self.settle();
        result
    }

    /// Drop the recorded error. No other field changes and no request runs.
    pub fn clear_error(&mut self) {
        self.state.error = None;
        self.notify();
    }

    fn begin(&mut self) {
        self.state.loading = true;
        self.state.error = None;
        self.notify();
    }

    /// Runs on the success and the failure path alike.
    fn settle(&mut self) {
        self.state.loading = false;
        self.notify();
    }

    fn notify(&mut self) {
        // Field-level split borrow: subscribers get the state read-only and
        // cannot reach back into the store.
        let state = &self.state;
        for subscriber in &mut self.subscribers {
            subscriber(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse, Transport};

    /// Transport replaying canned results while recording every request.
    /// Clones share the script and the request log.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        script: Rc<RefCell<VecDeque<Result<HttpResponse, ApiError>>>>,
        requests: Rc<RefCell<Vec<HttpRequest>>>,
    }

    impl ScriptedTransport {
        fn push_ok(&self, status: u16, body: &str) {
            self.script.borrow_mut().push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }));
        }

        fn push_err(&self, error: ApiError) {
            self.script.borrow_mut().push_back(Err(error));
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.borrow_mut().push(request);
            self.script.borrow_mut().pop_front().expect("script exhausted")
        }
    }

    fn scripted_store() -> (PersonStore, ScriptedTransport) {
        let transport = ScriptedTransport::default();
        let api = ApiClient::with_transport("http://mock/api", Box::new(transport.clone()));
        (PersonStore::new(api), transport)
    }

    fn person_json(id: i64, first_name: &str, last_name: &str) -> String {
        format!(
            r#"{{"id":{id},"first_name":"{first_name}","last_name":"{last_name}","created_at":"2024-01-15T10:30:00Z"}}"#
        )
    }

    fn input(first_name: &str, last_name: &str) -> PersonInput {
        PersonInput {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    #[test]
    fn initial_state_is_empty_idle_and_error_free() {
        let (store, _transport) = scripted_store();
        assert!(store.persons().is_empty());
        assert!(!store.loading());
        assert!(store.error().is_none());
    }

    #[test]
    fn fetch_all_adopts_the_server_sequence() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, &format!("[{}]", person_json(1, "John", "Doe")));
        store.fetch_all();
        assert_eq!(store.persons().len(), 1);
        assert_eq!(store.persons()[0].id, 1);
        assert_eq!(store.persons()[0].first_name, "John");
        assert!(!store.loading());
        assert!(store.error().is_none());
    }

    #[test]
    fn fetch_all_preserves_server_order() {
        let (mut store, transport) = scripted_store();
        let body = format!(
            "[{},{},{}]",
            person_json(2, "Jane", "Smith"),
            person_json(1, "John", "Doe"),
            person_json(3, "Alice", "Wonder")
        );
        transport.push_ok(200, &body);
        store.fetch_all();
        let ids: Vec<i64> = store.persons().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn fetch_all_replaces_instead_of_appending() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, &format!("[{}]", person_json(1, "John", "Doe")));
        store.fetch_all();
        transport.push_ok(200, &format!("[{}]", person_json(2, "Jane", "Smith")));
        store.fetch_all();
        assert_eq!(store.persons().len(), 1);
        assert_eq!(store.persons()[0].id, 2);
    }

    #[test]
    fn fetch_all_swallows_failures_and_keeps_the_collection() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, &format!("[{}]", person_json(1, "John", "Doe")));
        store.fetch_all();
        transport.push_err(ApiError::Transport("connection refused".to_string()));
        store.fetch_all();
        assert_eq!(store.persons().len(), 1);
        assert_eq!(store.persons()[0].id, 1);
        assert_eq!(store.error(), Some("network error: connection refused"));
        assert!(!store.loading());
    }

    #[test]
    fn create_appends_the_server_record() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(201, &person_json(3, "Alice", "Wonder"));
        let created = store.create(&input("Alice", "Wonder")).unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(store.persons().len(), 1);
        assert_eq!(store.persons()[0].id, 3);
        assert_eq!(store.persons()[0].first_name, "Alice");
        assert_eq!(store.persons()[0].last_name, "Wonder");
    }

    #[test]
    fn create_reraises_failures() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(500, "internal error");
        let err = store.create(&input("Alice", "Wonder")).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
        assert_eq!(store.error(), Some("HTTP 500: internal error"));
        assert!(store.persons().is_empty());
        assert!(!store.loading());
    }

    #[test]
    fn update_replaces_only_the_matching_entry() {
        let (mut store, transport) = scripted_store();
        let body = format!(
            "[{},{}]",
            person_json(1, "John", "Doe"),
            person_json(2, "Jane", "Smith")
        );
        transport.push_ok(200, &body);
        store.fetch_all();
        transport.push_ok(200, &person_json(1, "Johnny", "Doe"));
        let updated = store.update(1, &input("Johnny", "Doe")).unwrap();
        assert_eq!(updated.first_name, "Johnny");
        assert_eq!(store.persons().len(), 2);
        assert_eq!(store.persons()[0].first_name, "Johnny");
        assert_eq!(store.persons()[1].first_name, "Jane");
    }

    #[test]
    fn update_with_no_cached_entry_leaves_the_collection_untouched() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, &person_json(9, "Jane", "Smith"));
        let updated = store.update(9, &input("Jane", "Smith")).unwrap();
        assert_eq!(updated.id, 9);
        assert!(store.persons().is_empty());
        assert!(store.error().is_none());
    }

    #[test]
    fn update_reraises_failures() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(404, "not found");
        let err = store.update(999, &input("Jane", "Smith")).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 404, .. }));
        assert_eq!(store.error(), Some("HTTP 404: not found"));
    }

    #[test]
    fn remove_deletes_exactly_the_matching_entry() {
        let (mut store, transport) = scripted_store();
        let body = format!(
            "[{},{},{}]",
            person_json(1, "John", "Doe"),
            person_json(2, "Jane", "Smith"),
            person_json(3, "Alice", "Wonder")
        );
        transport.push_ok(200, &body);
        store.fetch_all();
        transport.push_ok(204, "");
        store.remove(2).unwrap();
        let ids: Vec<i64> = store.persons().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn remove_last_person_leaves_an_empty_collection() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, &format!("[{}]", person_json(1, "John", "Doe")));
        store.fetch_all();
        transport.push_ok(204, "");
        store.remove(1).unwrap();
        assert!(store.persons().is_empty());
    }

    #[test]
    fn remove_reraises_failures_and_keeps_the_collection() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, &format!("[{}]", person_json(1, "John", "Doe")));
        store.fetch_all();
        transport.push_ok(404, "not found");
        let err = store.remove(999).unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 404, .. }));
        assert_eq!(store.persons().len(), 1);
        assert_eq!(store.error(), Some("HTTP 404: not found"));
    }

    #[test]
    fn clear_error_resets_only_the_error() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, &format!("[{}]", person_json(1, "John", "Doe")));
        store.fetch_all();
        transport.push_err(ApiError::Transport("connection refused".to_string()));
        store.fetch_all();
        assert!(store.error().is_some());
        store.clear_error();
        assert!(store.error().is_none());
        assert_eq!(store.persons().len(), 1);
        assert!(!store.loading());
    }

    #[test]
    fn next_action_clears_the_previous_error() {
        let (mut store, transport) = scripted_store();
        transport.push_err(ApiError::Transport("connection refused".to_string()));
        store.fetch_all();
        assert!(store.error().is_some());
        transport.push_ok(200, "[]");
        store.fetch_all();
        assert!(store.error().is_none());
    }

    #[test]
    fn find_by_last_name_hits_and_misses() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, &format!("[{}]", person_json(1, "John", "Doe")));
        store.fetch_all();
        assert_eq!(store.find_by_last_name("Doe").map(|p| p.id), Some(1));
        assert!(store.find_by_last_name("Smith").is_none());
    }

    #[test]
    fn find_by_last_name_returns_the_first_match_in_order() {
        let (mut store, transport) = scripted_store();
        let body = format!(
            "[{},{}]",
            person_json(1, "John", "Doe"),
            person_json(2, "Jane", "Doe")
        );
        transport.push_ok(200, &body);
        store.fetch_all();
        assert_eq!(store.find_by_last_name("Doe").map(|p| p.id), Some(1));
    }

    #[test]
    fn subscribers_observe_the_loading_cycle() {
        let (mut store, transport) = scripted_store();
        let seen: Rc<RefCell<Vec<(bool, usize)>>> = Rc::default();
        let log = seen.clone();
        store.subscribe(move |state| log.borrow_mut().push((state.loading, state.persons.len())));
        transport.push_ok(200, &format!("[{}]", person_json(1, "John", "Doe")));
        store.fetch_all();
        // once when the action begins, once when it settles
        assert_eq!(*seen.borrow(), vec![(true, 0), (false, 1)]);
    }

    #[test]
    fn subscribers_observe_error_transitions() {
        let (mut store, transport) = scripted_store();
        let seen: Rc<RefCell<Vec<(bool, Option<String>)>>> = Rc::default();
        let log = seen.clone();
        store.subscribe(move |state| log.borrow_mut().push((state.loading, state.error.clone())));
        transport.push_err(ApiError::Transport("connection refused".to_string()));
        store.fetch_all();
        store.clear_error();
        let seen = seen.borrow();
        assert_eq!(seen[0], (true, None));
        assert_eq!(
            seen[1],
            (false, Some("network error: connection refused".to_string()))
        );
        assert_eq!(seen[2], (false, None));
    }

    /// Actions borrow the store mutably, so two actions on one instance
    /// cannot overlap: each loading cycle completes before the next begins.
    /// The strict true/false alternation below is the observable form of
    /// that guarantee.
    #[test]
    fn actions_serialize_per_store_instance() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, "[]");
        transport.push_ok(201, &person_json(1, "John", "Doe"));
        let flips: Rc<RefCell<Vec<bool>>> = Rc::default();
        let log = flips.clone();
        store.subscribe(move |state| log.borrow_mut().push(state.loading));
        store.fetch_all();
        store.create(&input("John", "Doe")).unwrap();
        assert_eq!(*flips.borrow(), vec![true, false, true, false]);
    }

    #[test]
    fn actions_call_the_expected_endpoints() {
        let (mut store, transport) = scripted_store();
        transport.push_ok(200, "[]");
        transport.push_ok(201, &person_json(5, "John", "Doe"));
        transport.push_ok(200, &person_json(5, "Johnny", "Doe"));
        transport.push_ok(204, "");
        store.fetch_all();
        store.create(&input("John", "Doe")).unwrap();
        store.update(5, &input("Johnny", "Doe")).unwrap();
        store.remove(5).unwrap();
        let calls: Vec<(String, String)> = transport
            .requests()
            .into_iter()
            .map(|r| (format!("{:?}", r.method), r.path))
            .collect();
        assert_eq!(
            calls,
            vec![
                ("Get".to_string(), "http://mock/api/hello/persons/".to_string()),
                ("Post".to_string(), "http://mock/api/hello/persons/".to_string()),
                ("Put".to_string(), "http://mock/api/hello/persons/5/".to_string()),
                ("Delete".to_string(), "http://mock/api/hello/persons/5/".to_string()),
            ]
        );
    }
}
