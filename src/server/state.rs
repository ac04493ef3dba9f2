use crate::compose::Composer;
use crate::settings::Settings;

pub(crate) struct ServerState {
    pub(crate) settings: Settings,
    pub(crate) composer: Composer,
    pub(crate) admin_token: Option<String>,
}
