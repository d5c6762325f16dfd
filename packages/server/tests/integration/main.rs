
mod activities;
mod auth;
mod events;
mod participations;
mod pushes;
mod users;
