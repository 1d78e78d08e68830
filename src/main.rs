mod app;
mod error;
mod logic;
mod models;
mod store;
mod utils;

fn main() -> anyhow::Result<()> {
    app::run()
}
