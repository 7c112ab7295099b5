use fibre_inject::{resolve, singleton, Container};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// The shared pool is built once; every tracker is new.
struct ConnectionPool {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() {
  let container = Container::new();

  // --- Singleton Registration ---
  // This provider will only be called ONCE.
  container.register(singleton(|| {
    println!("Creating SINGLETON ConnectionPool...");
    Arc::new(ConnectionPool {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    })
  }));

  // --- Plain Registration ---
  // This provider will be called EVERY time the service is resolved.
  container.register(|_pool: Arc<ConnectionPool>| {
    println!("Creating RequestTracker...");
    Arc::new(RequestTracker {
      id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
    })
  });

  println!("--- Resolving Singletons ---");
  let s1 = resolve!(container, Arc<ConnectionPool>);
  let s2 = resolve!(container, Arc<ConnectionPool>);
  println!("Pool 1 ID: {}, Pool 2 ID: {}", s1.id, s2.id);
  assert_eq!(s1.id, 0);
  assert!(Arc::ptr_eq(&s1, &s2), "Singleton instances should be identical");
  println!("Singleton instances are the same pointer, as expected.\n");

  println!("--- Resolving Per-Call Services ---");
  let t1 = resolve!(container, Arc<RequestTracker>);
  let t2 = resolve!(container, Arc<RequestTracker>);
  println!("Tracker 1 ID: {}, Tracker 2 ID: {}", t1.id, t2.id);
  assert_eq!(t1.id, 1);
  assert_eq!(t2.id, 2);
  assert!(!Arc::ptr_eq(&t1, &t2), "Trackers should be different");
  println!("Trackers are different pointers, and both reused the pool.");
}
