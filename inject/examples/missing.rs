use fibre_inject::{args, injectable, Container};

#[derive(Clone, Debug)]
struct ApiKey(String);

injectable!(ApiKey);

fn main() {
  let container = Container::new();
  container.register(|key: ApiKey| format!("client using {}", key.0));

  // Errors name the failing parameter, its position and the function.
  match container.resolve::<String>() {
    Ok(client) => println!("unexpected: {client}"),
    Err(err) => {
      println!("Resolution failed as expected:\n  {err}");
      assert!(err.root().is_unresolved());
    }
  }

  // Supplying the value positionally fixes the call.
  let client = container
    .invoke_as::<String, _, _>(
      |key: ApiKey| format!("client using {}", key.0),
      args![ApiKey("secret".to_string())],
    )
    .unwrap();
  println!("{client}");
}
