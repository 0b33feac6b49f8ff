use crate::domain::model::{City, CityRecord, Country, State};
use std::collections::HashSet;

/// A full buffer ready to be written as one multi-row insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flush {
    States(Vec<State>),
    Countries(Vec<Country>),
    Cities(Vec<City>),
}

impl Flush {
    pub fn len(&self) -> usize {
        match self {
            Flush::States(rows) => rows.len(),
            Flush::Countries(rows) => rows.len(),
            Flush::Cities(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits records into per-table buffers.
///
/// States and countries repeat on nearly every record, so each id is
/// buffered once per run. Buffers fill independently.
#[derive(Debug)]
pub struct Batcher {
    batch_size: usize,
    states: Vec<State>,
    countries: Vec<Country>,
    cities: Vec<City>,
    seen_states: HashSet<i32>,
    seen_countries: HashSet<i32>,
}

impl Batcher {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            states: Vec::new(),
            countries: Vec::new(),
            cities: Vec::with_capacity(batch_size),
            seen_states: HashSet::new(),
            seen_countries: HashSet::new(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn push(&mut self, record: CityRecord) -> Vec<Flush> {
        let (state, country, city) = record.split();

        if self.seen_states.insert(state.id) {
            self.states.push(state);
        }
        if self.seen_countries.insert(country.id) {
            self.countries.push(country);
        }
        self.cities.push(city);

        let mut ready = Vec::new();
        if self.states.len() >= self.batch_size {
            ready.push(Flush::States(std::mem::take(&mut self.states)));
        }
        if self.countries.len() >= self.batch_size {
            ready.push(Flush::Countries(std::mem::take(&mut self.countries)));
        }
        if self.cities.len() >= self.batch_size {
            ready.push(Flush::Cities(std::mem::replace(
                &mut self.cities,
                Vec::with_capacity(self.batch_size),
            )));
        }
        ready
    }

    /// Drains whatever is left, parents first.
    pub fn finish(&mut self) -> Vec<Flush> {
        let mut ready = Vec::new();
        if !self.states.is_empty() {
            ready.push(Flush::States(std::mem::take(&mut self.states)));
        }
        if !self.countries.is_empty() {
            ready.push(Flush::Countries(std::mem::take(&mut self.countries)));
        }
        if !self.cities.is_empty() {
            ready.push(Flush::Cities(std::mem::take(&mut self.cities)));
        }
        ready
    }
}
