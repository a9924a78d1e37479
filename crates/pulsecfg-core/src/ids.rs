use rand::distr::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

pub trait IdSource {
    fn entity_id(&mut self) -> String;
    fn token(&mut self) -> String;
}

#[derive(Debug, Clone)]
pub struct RandomIds {
    token_length: usize,
}

impl RandomIds {
    pub fn new(token_length: usize) -> Self {
        Self { token_length }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new(50)
    }
}

impl IdSource for RandomIds {
    fn entity_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }

    fn token(&mut self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.token_length)
            .map(char::from)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next_id: u64,
    next_token: u64,
}

impl IdSource for SequentialIds {
    fn entity_id(&mut self) -> String {
        self.next_id += 1;
        format!("id-{}", self.next_id)
    }

    fn token(&mut self) -> String {
        self.next_token += 1;
        format!("token-{}", self.next_token)
    }
}
