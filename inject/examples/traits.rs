use fibre_inject::{args, resolve, singleton, Container};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self, title: &str) {
    self.logger.log(&format!("Starting report '{title}'."));
    self.logger.log("Finished report generation.");
  }
}

fn main() {
  let container = Container::new();

  // --- Registration ---

  // The provider's declared return type is the key: `Arc<dyn Logger>`.
  container.register(singleton(|| -> Arc<dyn Logger> { Arc::new(ConsoleLogger) }));

  // ReportService declares the logger as a parameter instead of creating it.
  container.register(|logger: Arc<dyn Logger>| Arc::new(ReportService { logger }));

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve!(container, Arc<ReportService>);
  report_service.generate_report("weekly");

  // Functions can mix injected services with positional arguments.
  container
    .invoke(
      |service: Arc<ReportService>, title: &'static str| service.generate_report(title),
      args!["monthly"],
    )
    .unwrap();
}
