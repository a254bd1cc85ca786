//! Terminal walkthrough of the persons API driven through the store.
//!
//! Boots the mock server on a random port in a background thread, then walks
//! the flow a view would drive: greeting, fetching, creating, lookup,
//! updating, a failing update with recovery, deleting, weather. Lines
//! starting with `state:` are printed from the store's change notifications;
//! everything else is the scripted user flow.

use std::error::Error;
use std::net::SocketAddr;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use persons_core::{ApiClient, CollectionState, PersonInput, PersonStore};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = start_mock_server()?;
    info!("mock api listening on http://{addr}/api");
    let base_url = format!("http://{addr}/api");

    // Greeting and weather live outside the person collection; the view
    // calls the adapter directly for them.
    let api = ApiClient::new(&base_url);
    println!("> {}", api.get_hello()?.message);

    let mut store = PersonStore::new(ApiClient::new(&base_url));
    store.subscribe(print_state);

    println!("\nfetching persons");
    store.fetch_all();
    println!("> {} on the server", store.persons().len());

    println!("\ncreating two persons");
    let john = store.create(&person("John", "Doe"))?;
    println!("> created #{}: {} {}", john.id, john.first_name, john.last_name);
    let jane = store.create(&person("Jane", "Smith"))?;
    println!("> created #{}: {} {}", jane.id, jane.first_name, jane.last_name);

    println!("\ngreeting by last name");
    greet(&api, "Doe")?;
    greet(&api, "")?;
    greet(&api, "Nobody")?;

    println!("\nlooking up by last name");
    match store.find_by_last_name("Smith") {
        Some(p) => println!("> found #{}: {} {}", p.id, p.first_name, p.last_name),
        None => println!("> no match"),
    }

    println!("\nupdating #{}", john.id);
    let updated = store.update(john.id, &person("Johnny", "Doe"))?;
    println!("> now {} {}", updated.first_name, updated.last_name);

    println!("\nupdating a missing id");
    if let Err(e) = store.update(999, &person("Nobody", "Nowhere")) {
        println!("> update failed: {e}");
    }
    println!("> error region: {:?}", store.error());
    store.clear_error();
    println!("> error region after dismissing: {:?}", store.error());

    println!("\nremoving #{}", jane.id);
    store.remove(jane.id)?;
    println!("> {} left", store.persons().len());

    println!("\nweather");
    println!("> {}", api.get_weather()?.message);

    Ok(())
}

/// Render one store snapshot, the terminal stand-in for reactive bindings.
fn print_state(state: &CollectionState) {
    let status = if state.loading { "loading..." } else { "idle" };
    match &state.error {
        Some(message) => {
            println!("  state: {status} | persons: {} | error: {message}", state.persons.len());
        }
        None => println!("  state: {status} | persons: {}", state.persons.len()),
    }
}

/// Greet by last name. An empty name never leaves the view: submission is
/// blocked until the field is filled in.
fn greet(api: &ApiClient, last_name: &str) -> Result<(), Box<dyn Error>> {
    let trimmed = last_name.trim();
    if trimmed.is_empty() {
        println!("> (submit disabled: last name is required)");
        return Ok(());
    }
    println!("> {}", api.get_hello_person(trimmed)?.message);
    Ok(())
}

fn person(first_name: &str, last_name: &str) -> PersonInput {
    PersonInput {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
    }
}

/// Bind a random port, serve the mock API from a background thread, and
/// return the bound address. Nothing joins the serving thread, so failures
/// inside it are logged rather than returned.
fn start_mock_server() -> Result<SocketAddr, Box<dyn Error>> {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = std_listener.local_addr()?;
    std_listener.set_nonblocking(true)?;

    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    std::thread::spawn(move || {
        let served = rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener)?;
            mock_server::run(listener).await
        });
        if let Err(e) = served {
            error!(error = %e, "mock server stopped");
        }
    });

    Ok(addr)
}
