mod app;
mod helpers;
mod list_models;
mod respond;
