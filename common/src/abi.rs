//! Solidity interface of the deployed WavePortal contract.
//!
//! Only the surface the front end consumes is declared here. Field order in
//! `Wave` matches the deployed contract and must not be rearranged: it
//! determines the ABI layout of `getAllWaves()`.

use alloy_sol_types::sol;

sol! {
    #[sol(all_derives)]
    interface IWavePortal {
        struct Wave {
            address waver;
            string message;
            uint256 timestamp;
        }

        event NewWave(address indexed from, uint256 timestamp, string message);

        function wave(string _message) external;
        function getAllWaves() external view returns (Wave[] memory);
        function getTotalWaves() external view returns (uint256);
    }
}

pub use IWavePortal::{
    getAllWavesCall, getTotalWavesCall, waveCall, IWavePortalCalls, NewWave, Wave,
};
