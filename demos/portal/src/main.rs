//! Walks the property portal's routes as a browser session would.
//!
//! ```text
//! PORTAL_USERNAME=alice PORTAL_PASSWORD=secret cargo run -p portal
//! cargo run -p portal -- portal.json
//! ```
//!
//! The optional argument is a `ClientConfig` JSON file; without it the
//! portal's built-in route table and `PORTAL_API_URL` (default
//! `http://localhost:8080/api`) are used.

use warden::prelude::*;

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

fn portal_routes() -> RouteTable {
    RouteTable::new()
        .route("dashboard", "/", RouteRequirement::authenticated())
        .route(
            "properties",
            "/properties",
            RouteRequirement::authenticated().with_roles(["ROLE_OWNER", "ROLE_ADMIN", "ROLE_TENANT"]),
        )
        .route("maintenance", "/maintenance", RouteRequirement::authenticated())
        .route("leases", "/leases", RouteRequirement::authenticated())
        .route(
            "payments",
            "/payments",
            RouteRequirement::authenticated().with_roles(["ROLE_OWNER", "ROLE_ADMIN"]),
        )
        .route("login", "/login", RouteRequirement::guest_only())
        .route("register", "/register", RouteRequirement::guest_only())
}

fn load_config() -> Result<ClientConfig, WardenError> {
    if let Some(path) = std::env::args().nth(1) {
        let json = std::fs::read_to_string(&path)
            .map_err(|e| WardenError::Config(format!("{path}: {e}")))?;
        return ClientConfig::from_json(&json);
    }

    let mut config = ClientConfig {
        routes: portal_routes(),
        ..ClientConfig::default()
    };
    if let Ok(url) = std::env::var("PORTAL_API_URL") {
        config.base_url = url;
    }
    Ok(config.validated())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), WardenError> {
    warden::init_tracing();

    let client = WardenClient::builder().config(load_config()?).build()?;

    let mut events = client.session().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(?event, "session event");
        }
    });

    // First visit: a protected route forces the session restore.
    let landed = client.navigate("/").await;
    println!("/ -> {landed}");

    if landed.starts_with(&client.config().guard.login_route) {
        let (Ok(username), Ok(password)) = (
            std::env::var("PORTAL_USERNAME"),
            std::env::var("PORTAL_PASSWORD"),
        ) else {
            println!("not logged in; set PORTAL_USERNAME and PORTAL_PASSWORD to log in");
            return Ok(());
        };

        let user = client.login(&username, &password).await?;
        println!("logged in as {user}, roles {:?}", user.roles);
        println!("resuming at {}", client.guard().return_target(&landed));
    }

    let paths: Vec<String> = client.config().routes.iter().map(|r| r.path.clone()).collect();
    for path in paths {
        let landed = client.navigate(&path).await;
        let verdict = if landed == path { "allowed" } else { "redirected" };
        println!("{path:<14} {verdict:<10} -> {landed}");
    }

    match client.send_json::<serde_json::Value>(ApiRequest::get("/properties")).await {
        Ok(body) => println!("properties: {body}"),
        Err(e) => println!("properties unavailable: {e}"),
    }

    client.logout().await;
    println!("logged out; / -> {}", client.navigate("/").await);
    Ok(())
}
