mod properties;
mod recall;
