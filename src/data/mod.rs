mod local_datasource;
mod polls;
mod remote_datasource;
mod votes;

pub use {local_datasource::*, polls::*, remote_datasource::*, votes::*};
