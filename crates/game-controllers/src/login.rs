//! The login ceremony is identical across games: three fields on the host's
//! landing page. Controllers share this predicate; the session driver owns
//! the actual join.

use jitb_core_types::Selector;
use jitb_dom_facade::{Dom, DomError};

pub const ROOM_CODE_ID: &str = "roomcode";
pub const USERNAME_ID: &str = "username";
pub const JOIN_BUTTON_ID: &str = "button-join";

/// Room-code, username and join-button fields all present.
pub async fn is_login_page(dom: &dyn Dom) -> Result<bool, DomError> {
    for id in [ROOM_CODE_ID, USERNAME_ID, JOIN_BUTTON_ID] {
        if dom.locate(&Selector::id(id)).await?.is_none() {
            return Ok(false);
        }
    }
    Ok(true)
}
