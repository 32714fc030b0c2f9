use std::time::{Duration, Instant};

/// 固定節奏的 tick 時鐘
///
/// 每個 tick 把剩餘時間睡掉（spin_sleep 補精度），並回報上一個
/// tick 實際經過的時間給模擬用。
pub struct Clock {
    target_dt: Duration,
    last: Instant,
    last_dt: Duration,
}

impl Clock {
    pub fn new(target_dt: Duration) -> Self {
        Self {
            target_dt,
            last: Instant::now(),
            last_dt: target_dt,
        }
    }

    /// 上一個 tick 實際經過的時間
    pub fn dt(&self) -> Duration {
        self.last_dt
    }

    /// 等到下一個 tick 的時間點
    pub fn tick(&mut self) {
        let elapsed = self.last.elapsed();
        if elapsed < self.target_dt {
            spin_sleep::sleep(self.target_dt - elapsed);
        }
        let now = Instant::now();
        self.last_dt = now.duration_since(self.last);
        self.last = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_paces_ticks() {
        let target = Duration::from_millis(10);
        let mut clock = Clock::new(target);
        assert_eq!(clock.dt(), target);

        clock.tick();
        assert!(clock.dt() >= target, "tick 至少要等滿目標間隔");
    }
}
