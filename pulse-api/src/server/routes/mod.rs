use crate::server::ServerRouter;

mod authors;
mod contents;
mod tags;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(contents::routes())
        .merge(authors::routes())
        .merge(tags::routes())
}
