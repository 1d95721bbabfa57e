//! Given steps for delivery ordering scenarios.

use super::world::{DeliveryWorld, RecordingConnection, run_async};
use eyre::ensure;
use lexbus::envelope::UserId;
use rstest_bdd_macros::given;

#[given(r#"user "{user}" has no open connection"#)]
fn user_has_no_connection(world: &mut DeliveryWorld, user: String) -> Result<(), eyre::Report> {
    let user_id = UserId::new(user);
    run_async(world.registry.unregister(&user_id, None));
    ensure!(
        !run_async(world.registry.contains(&user_id)),
        "registry still lists a connection for {user_id}"
    );
    Ok(())
}

#[given("the delivery buffer holds at most {limit:usize} messages")]
fn buffer_holds_at_most(world: &mut DeliveryWorld, limit: usize) {
    world.set_buffer_limit(limit);
}

#[given(r#""{user}" opens a connection named "{name}""#)]
fn opens_connection(world: &mut DeliveryWorld, user: String, name: String) {
    world.open_connection(&user, name, RecordingConnection::default());
}
