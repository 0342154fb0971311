mod commands;
mod console;
