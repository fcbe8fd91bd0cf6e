use super::*;
use crate::state::ListStateHandle;

#[test]
fn test_list_state_preserves_insertion_order() {
    let mut backend = HashMapStateBackend::new();
    backend.set_current_key(b"key1".to_vec());

    let events = ListStateHandle::<String>::new("events");
    assert_eq!(events.get(&backend).unwrap(), Vec::<String>::new());

    events.add(&mut backend, "event1".to_string()).unwrap();
    events.add(&mut backend, "event2".to_string()).unwrap();
    events.add(&mut backend, "event0".to_string()).unwrap();
    assert_eq!(
        events.get(&backend).unwrap(),
        vec!["event1".to_string(), "event2".to_string(), "event0".to_string()]
    );

    events.clear(&mut backend).unwrap();
    assert_eq!(events.get(&backend).unwrap(), Vec::<String>::new());
}

#[test]
fn test_list_state_scoped_by_key() {
    let mut backend = HashMapStateBackend::new();
    let items = ListStateHandle::<i64>::new("items");

    backend.set_current_key(b"w1".to_vec());
    items.add(&mut backend, 1).unwrap();

    backend.set_current_key(b"w2".to_vec());
    items.add(&mut backend, 2).unwrap();
    items.add(&mut backend, 3).unwrap();
    assert_eq!(items.key_count(&backend), 2);

    backend.set_current_key(b"w1".to_vec());
    assert_eq!(items.get(&backend).unwrap(), vec![1]);
    items.clear(&mut backend).unwrap();
    assert_eq!(items.key_count(&backend), 1);

    backend.set_current_key(b"w2".to_vec());
    assert_eq!(items.get(&backend).unwrap(), vec![2, 3]);
}

#[test]
fn test_list_state_scoped_by_name() {
    let mut backend = HashMapStateBackend::new();
    backend.set_current_key(b"k".to_vec());
    let a = ListStateHandle::<u8>::new("a");
    let b = ListStateHandle::<u8>::new("b");

    a.add(&mut backend, 1).unwrap();
    assert!(b.get(&backend).unwrap().is_empty());
    assert_eq!(a.key_count(&backend), 1);
    assert_eq!(b.key_count(&backend), 0);
    assert_eq!(a.name(), "a");
}

#[test]
fn test_state_access_without_key_fails() {
    let mut backend = HashMapStateBackend::new();
    let items = ListStateHandle::<i64>::new("items");

    assert!(backend.current_key().is_none());
    assert!(items.get(&backend).is_err());
    assert!(items.add(&mut backend, 1).is_err());
}
