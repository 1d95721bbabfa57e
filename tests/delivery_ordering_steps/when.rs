//! When steps for delivery ordering scenarios.

use super::world::{DeliveryWorld, RecordingConnection, reply_for, run_async, split_texts};
use lexbus::envelope::UserId;
use rstest_bdd_macros::when;

#[when(r#"replies "{texts}" arrive for "{user}""#)]
fn replies_arrive(
    world: &mut DeliveryWorld,
    texts: String,
    user: String,
) -> Result<(), eyre::Report> {
    let user_id = UserId::new(user);
    for text in split_texts(&texts) {
        let envelope = reply_for(&user_id, &text)?;
        run_async(world.bridge.accept(envelope))
            .ok_or_else(|| eyre::eyre!("reply for {user_id} was dropped"))?;
    }
    Ok(())
}

#[when(r#""{user}" opens a connection named "{name}""#)]
fn user_opens_connection(world: &mut DeliveryWorld, user: String, name: String) {
    world.open_connection(&user, name, RecordingConnection::default());
}

#[when(r#""{user}" opens a flaky connection named "{name}" that refuses "{text}" once"#)]
fn user_opens_flaky_connection(
    world: &mut DeliveryWorld,
    user: String,
    name: String,
    text: String,
) {
    world.open_connection(&user, name, RecordingConnection::refusing(&text));
}

#[when(r#"the buffer for "{user}" is flushed"#)]
fn buffer_flushed(world: &mut DeliveryWorld, user: String) {
    let _report = run_async(world.bridge.flush_user(&UserId::new(user)));
}
