pub mod equity_schedule;

pub use equity_schedule::{
    build_equity_schedule, sale_proceeds, EquitySchedule, EquityScheduleInput, EquityScheduleRow,
    ExitPosition,
};
