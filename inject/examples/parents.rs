use fibre_inject::{args, injectable, Container};

#[derive(Clone)]
struct AppName(String);

#[derive(Clone)]
struct RequestId(u64);

injectable!(AppName, RequestId);

fn main() {
  // Application-wide registrations live in the root container.
  let app = Container::new();
  app.bind(AppName("inventory".to_string()));

  // Each request gets a child that adds its own values on top.
  for id in 1..=3 {
    let request = app.child();
    request.bind(RequestId(id));

    let line = request
      .invoke_as::<String, _, _>(
        |app: AppName, request: RequestId, path: &'static str| {
          format!("[{}] request #{} -> {}", app.0, request.0, path)
        },
        args!["/items"],
      )
      .unwrap();
    println!("{line}");
  }

  // The root never sees the request scoped values.
  assert!(!app.contains::<RequestId>());
}
