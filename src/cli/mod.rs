//! # CLI Module
//!
//! Command-line tools for inspecting a route table without writing a server.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Load a route file and print the resulting table, including the tree path
//! of every route (which shows all parameter names bound at shared positions):
//!
//! ```bash
//! brrtmux routes --file routes.yaml
//! ```
//!
//! ### `probe`
//!
//! Dispatch one request through the route table and print the response. Every
//! route is served by an echo handler, so the body shows which route matched and
//! what parameters it extracted:
//!
//! ```bash
//! brrtmux probe --file routes.yaml GET /users/42?verbose=1
//! ```
//!
//! ## Route Files
//!
//! ```yaml
//! routes:
//!   - method: GET
//!     path: /users/:id
//!     name: get_user
//!   - method: GET
//!     path: /static/*filepath
//! ```
//!
//! Both commands accept `--config <FILE>` to load a
//! [`DispatcherConfig`](crate::config::DispatcherConfig) from YAML.

mod commands;


pub use commands::{build_dispatcher, run, run_cli, Cli, Commands, RouteEntry, RouteFile};
