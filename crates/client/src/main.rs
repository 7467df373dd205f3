//! Lunch - command-line session against the lunch service.
//!
//! Signs in with the session cookie (if any), loads places and rolls, prints
//! them, then keeps printing as other clients roll and boost until Ctrl-C.

use anyhow::Context;
use lunch_client::{logging, ClientConfig, LunchClient};
use lunch_shared::{Place, Roll};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("lunch_client=info");

    let config = ClientConfig::from_env().context("invalid configuration")?;
    lunch_client::log_info!("connecting to {}", config.ws_url);
    let client = LunchClient::new(&config)?;

    match client.users.get_me().await? {
        Some(user) => println!("Signed in as {}", user.name),
        None => println!("Not signed in"),
    }

    let (places, rolls) = tokio::join!(client.places.list(), client.rolls.list());
    places.context("failed to list places")?;
    rolls.context("failed to list rolls")?;

    let mut places = client.stores().places_by_chance();
    let mut rolls = client.stores().rolls_newest_first();
    print_places(&places.borrow_and_update());
    print_rolls(&rolls.borrow_and_update());

    loop {
        tokio::select! {
            changed = places.changed() => {
                if changed.is_err() { break; }
                print_places(&places.borrow_and_update());
            }
            changed = rolls.changed() => {
                if changed.is_err() { break; }
                print_rolls(&rolls.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

fn print_places(places: &[Place]) {
    println!("Places:");
    for place in places {
        println!("  {:>6.2}  {}", place.chance, place.name);
    }
}

fn print_rolls(rolls: &[Roll]) {
    println!("Rolls:");
    for roll in rolls.iter().take(10) {
        let place = roll.place.as_ref().map_or(roll.place_id.as_str(), |p| p.name.as_str());
        let user = roll.user.as_ref().map_or(roll.user_id.as_str(), |u| u.name.as_str());
        println!("  {}  {} -> {}", roll.time.format("%Y-%m-%d %H:%M"), user, place);
    }
}
