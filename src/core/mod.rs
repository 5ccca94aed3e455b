pub mod body;
pub mod cookie;
pub mod handler;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

pub use body::{BodyValue, FormMap, FormValue, MessageData, RequestData};
pub use cookie::{RequestCookie, SetCookie};
pub use handler::{BoxFuture, HandlerError, HandlerResult, HttpHandler, WsHandler};
pub use request::{DecodeError, HttpRequest, WsRequest};
pub use response::{HttpResponse, WsResponder};
pub use router::{
    HttpResolution, HttpRouteTable, RouteDef, RouteError, RoutePattern, WsResolution, WsRouteDef,
    WsRouteTable,
};
pub use service::App;
