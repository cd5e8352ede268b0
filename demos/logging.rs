//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use dependency_registry::{
    CallbackRecord, Container, ContainerBuilder, InstanceRecord, RecordStore, Resolver,
    ResolverExt, SharedResolver,
};
use std::sync::Arc;

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct UserService {
    db: Arc<Database>,
    page_size: u32,
}

fn main() -> dependency_registry::Result<()> {
    // Initialize logging - uses JSON if logging-json feature enabled,
    // pretty if logging-pretty enabled
    dependency_registry::logging::init();

    println!("=== Dependency Registry Logging Demo ===\n");

    // A sub-container for settings (logs: "Registering record", "Creating container")
    let settings = RecordStore::new();
    settings.add(
        "page_size",
        CallbackRecord::new(|_| {
            println!("  [App] Computing page size...");
            Ok(25u32)
        }),
    )?;
    let settings: SharedResolver = Arc::new(Container::new(settings));

    let mut builder = ContainerBuilder::new();
    builder
        .mount("settings", settings)?
        .value("db_url", String::from("postgres://localhost/mydb"))?
        .add(
            "database",
            InstanceRecord::new(["db_url"], |args| {
                Ok(Database {
                    url: (*args.arg::<String>(0)?).clone(),
                })
            }),
        )?
        .add(
            "users",
            InstanceRecord::new(["database", "settings.page_size"], |args| {
                Ok(UserService {
                    db: args.arg::<Database>(0)?,
                    page_size: *args.arg::<u32>(1)?,
                })
            }),
        )?;

    // Decorate the URL (logs: "Moved record to alias", "Decorated record")
    builder.decorate("db_url", |previous| {
        InstanceRecord::new([previous], |args| {
            Ok(format!("{}?sslmode=require", args.arg::<String>(0)?))
        })
    })?;

    // Build with cycle detection (logs: "Creating composite container")
    let container = builder.build_tracked()?;

    // Resolve (logs: "Entering resolution", "Resolving record on first access")
    let users = container.get_as::<UserService>("users")?;
    println!("  [App] users page size = {}", users.page_size);
    println!("  [App] database url = {}", users.db.url);

    // Second resolution hits the caches (logs: "Record already resolved")
    let _ = container.get("users")?;

    // Missing identifiers carry the lookup path (logs: "Record not found")
    match container.get("settings.timeout") {
        Ok(_) => unreachable!("settings.timeout is not defined"),
        Err(err) => println!("  [App] expected failure: {err}"),
    }

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (pretty output)");

    Ok(())
}
