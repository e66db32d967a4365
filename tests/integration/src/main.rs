mod helpers;

mod reports;
