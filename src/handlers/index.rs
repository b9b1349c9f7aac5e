// src/handlers/index.rs
use warp::reply::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

pub async fn get_index() -> Result<Html<&'static str>, warp::Rejection> {
    Ok(warp::reply::html(INDEX_HTML))
}
