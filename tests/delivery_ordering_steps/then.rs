//! Then steps for delivery ordering scenarios.

use super::world::{DeliveryWorld, split_texts};
use eyre::ensure;
use lexbus::envelope::UserId;
use rstest_bdd_macros::then;

#[then(r#"connection "{name}" received "{texts}""#)]
fn connection_received(
    world: &mut DeliveryWorld,
    name: String,
    texts: String,
) -> Result<(), eyre::Report> {
    let received = world.connection(&name)?.received();
    let expected = split_texts(&texts);
    ensure!(
        received == expected,
        "connection {name} received {received:?}, expected {expected:?}"
    );
    Ok(())
}

#[then(r#"connection "{name}" got "{text}" exactly once"#)]
fn connection_got_once(
    world: &mut DeliveryWorld,
    name: String,
    text: String,
) -> Result<(), eyre::Report> {
    let received = world.connection(&name)?.received();
    let count = received.iter().filter(|candidate| **candidate == text).count();
    ensure!(
        count == 1,
        "connection {name} got {text} {count} times: {received:?}"
    );
    Ok(())
}

#[then(r#"the buffer for "{user}" holds "{texts}""#)]
fn buffer_holds(
    world: &mut DeliveryWorld,
    user: String,
    texts: String,
) -> Result<(), eyre::Report> {
    let buffered = world.buffered_texts(&UserId::new(user));
    let expected = split_texts(&texts);
    ensure!(
        buffered == expected,
        "buffer holds {buffered:?}, expected {expected:?}"
    );
    Ok(())
}

#[then(r#"the buffer for "{user}" is empty"#)]
fn buffer_is_empty(world: &mut DeliveryWorld, user: String) -> Result<(), eyre::Report> {
    let buffered = world.buffered_texts(&UserId::new(user));
    ensure!(buffered.is_empty(), "buffer still holds {buffered:?}");
    Ok(())
}
