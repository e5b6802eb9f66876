mod config;
mod signin_flow;
