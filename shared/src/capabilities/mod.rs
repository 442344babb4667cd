mod dialer;
mod http;
mod timer;

pub use crux_core::render::Render;
pub use crux_http::Http;

pub use self::dialer::{DialError, DialOperation, DialResult, Dialer};
pub use self::http::{
    HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResult, ValidatedUrl,
    REQUEST_ID_HEADER,
};
pub use self::timer::{Timer, TimerId, TimerOperation, TimerOutput};

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub timer: Timer<Event>,
    pub dialer: Dialer<Event>,
}
